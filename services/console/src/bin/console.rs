//! services/console/src/bin/console.rs

use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use console_lib::{
    adapters::{FileCredentialStore, HttpAdminApi, OpenAiQuizAdapter},
    config::Config,
    error::ConsoleError,
    views::{QuizListView, UserListView},
};
use quizr_console_core::{
    session_ttl, AdminApi, AdminUser, ApiError, AuthGate, AuthStatus, CredentialStore,
    GenerationPhase, GenerationWorkflow, NewUser, QuizGenerator, ResourcePool, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting console...");

    // --- 2. Initialize Service Adapters ---
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(&config.session_file));
    let api: Arc<dyn AdminApi> = Arc::new(HttpAdminApi::new(
        &config.server_url,
        config.request_timeout,
        store.clone(),
    )?);

    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ConsoleError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let generator: Arc<dyn QuizGenerator> = Arc::new(OpenAiQuizAdapter::new(
        openai_client,
        config.quiz_model.clone(),
    ));

    let gate = AuthGate::new(
        api.clone(),
        store.clone(),
        format!("{}/admin/user", config.server_url),
    );

    // --- 3. Session Loop ---
    // Identity check first; an unusable session drops to the login prompt,
    // a confirmed one goes straight to the dashboard.
    let mut prompt = Prompt::new();
    loop {
        let user = match gate.check().await {
            AuthStatus::Authenticated(user) => user,
            AuthStatus::Checking | AuthStatus::Unauthenticated { .. } => {
                if !login(&mut prompt, api.as_ref(), store.as_ref()).await? {
                    return Ok(());
                }
                continue;
            }
        };

        info!(username = %user.username, "session confirmed");
        match dashboard(&mut prompt, &config, &api, &store, &generator, &user).await? {
            SessionEnd::Logout => continue,
            SessionEnd::Quit => return Ok(()),
        }
    }
}

enum SessionEnd {
    Logout,
    Quit,
}

/// Line-oriented terminal input with an inline prompt label.
struct Prompt {
    reader: BufReader<Stdin>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }

    async fn ask(&mut self, label: &str) -> Result<String, ConsoleError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(label.as_bytes()).await?;
        stdout.flush().await?;
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            // EOF on stdin ends the session like an explicit quit.
            return Ok("quit".to_owned());
        }
        Ok(line.trim().to_owned())
    }
}

/// Prompts for credentials and stores the issued token on success.
/// Returns false when the operator quits at the prompt.
async fn login(
    prompt: &mut Prompt,
    api: &dyn AdminApi,
    store: &dyn CredentialStore,
) -> Result<bool, ConsoleError> {
    println!("Sign in to the admin backend (or type 'quit').");
    loop {
        let username = prompt.ask("username: ").await?;
        if username == "quit" {
            return Ok(false);
        }
        let password = prompt.ask("password: ").await?;

        match api.login(&username, &password).await {
            Ok(token) => {
                store.set(&token, session_ttl());
                println!("Signed in.");
                return Ok(true);
            }
            Err(err) => println!("Login failed: {err}"),
        }
    }
}

/// The authenticated command loop. Both list views poll in the background for
/// the whole lifetime of this function; dropping the views on exit stops the
/// polling.
async fn dashboard(
    prompt: &mut Prompt,
    config: &Config,
    api: &Arc<dyn AdminApi>,
    store: &Arc<dyn CredentialStore>,
    generator: &Arc<dyn QuizGenerator>,
    user: &AdminUser,
) -> Result<SessionEnd, ConsoleError> {
    let token = store.get().map(|c| c.token).unwrap_or_default();
    let quiz_pool = ResourcePool::new();
    let user_pool = ResourcePool::new();
    let quizzes = QuizListView::subscribe(
        &quiz_pool,
        api.clone(),
        &config.server_url,
        &token,
        config.poll_interval,
    );
    let users = UserListView::subscribe(
        &user_pool,
        api.clone(),
        &config.server_url,
        &token,
        config.poll_interval,
    );
    let workflow = GenerationWorkflow::new(generator.clone(), api.clone());

    println!("Signed in as {}. Type 'help' for commands.", user.username);
    loop {
        let line = prompt.ask("> ").await?;
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "" => {}
            "help" => print_help(),
            "whoami" => println!("{}", user.username),
            "quizzes" => print!("{}", quizzes.render()),
            "users" => print!("{}", users.render()),
            "quiz" => match rest.parse::<usize>().ok().and_then(|i| quizzes.detail(i)) {
                Some(detail) => println!("{detail}"),
                None => println!("No quiz at that index. 'quizzes' lists them."),
            },
            "refresh" => {
                quizzes.refresh();
                users.refresh();
            }
            "generate" => {
                run_generation(&workflow, rest).await;
                quizzes.refresh();
            }
            "retry" => match workflow.retry_persist().await {
                SubmitOutcome::Settled => {
                    print_workflow(&workflow);
                    quizzes.refresh();
                }
                SubmitOutcome::Invalid | SubmitOutcome::Rejected => {
                    println!("Nothing to retry. 'retry' only re-saves a quiz whose save failed.");
                }
            },
            "status" => print_workflow(&workflow),
            "reset" => {
                if !workflow.reset() {
                    println!("A generation attempt is still running.");
                }
            }
            "adduser" => match add_user_dialog(prompt, api.as_ref()).await? {
                Ok(()) => {
                    println!("User registered.");
                    users.refresh();
                }
                Err(ApiError::Auth) => {
                    println!("Session rejected by the backend; please sign in again.");
                    store.clear();
                    return Ok(SessionEnd::Logout);
                }
                Err(err) => println!("Registration failed: {err}"),
            },
            "logout" => {
                store.clear();
                println!("Signed out.");
                return Ok(SessionEnd::Logout);
            }
            "quit" | "exit" => return Ok(SessionEnd::Quit),
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }
}

/// Runs one generation attempt to completion and reports the outcome.
async fn run_generation(workflow: &GenerationWorkflow, topic: &str) {
    match workflow.submit(topic).await {
        SubmitOutcome::Settled => print_workflow(workflow),
        SubmitOutcome::Invalid => {
            let snapshot = workflow.snapshot();
            println!(
                "{}",
                snapshot
                    .error
                    .unwrap_or_else(|| "Invalid topic.".to_owned())
            );
        }
        SubmitOutcome::Rejected => {
            println!("Another attempt is in flight, or the last one needs 'reset' first.");
        }
    }
}

fn print_workflow(workflow: &GenerationWorkflow) {
    let snapshot = workflow.snapshot();
    match snapshot.phase {
        GenerationPhase::Idle => println!("No generation attempt in progress."),
        GenerationPhase::Validating | GenerationPhase::Generating => {
            println!("Generating a quiz for '{}'...", snapshot.prompt)
        }
        GenerationPhase::Persisting => println!("Saving the generated quiz..."),
        GenerationPhase::Succeeded => {
            println!("Quiz for '{}' generated and saved:", snapshot.prompt.trim());
            if let Some(result) = &snapshot.result {
                println!("{result}");
            }
        }
        GenerationPhase::Failed => {
            if let Some(error) = &snapshot.error {
                println!("Generation attempt failed: {error}");
            }
            if snapshot.result.is_some() {
                println!("The generated text is kept; 'retry' re-attempts the save.");
            }
            println!("'reset' clears the attempt.");
        }
    }
}

/// Gathers the registration fields interactively and submits them.
/// The inner result separates dialog I/O failures from backend rejections.
async fn add_user_dialog(
    prompt: &mut Prompt,
    api: &dyn AdminApi,
) -> Result<Result<(), ApiError>, ConsoleError> {
    let email = prompt.ask("email: ").await?;
    let password = prompt.ask("password: ").await?;
    let user_type = prompt.ask("type (student/professor): ").await?;
    let degree_code = if user_type == "student" {
        Some(prompt.ask("degree code: ").await?)
    } else {
        None
    };
    let first_name = prompt.ask("first name: ").await?;
    let last_name = prompt.ask("last name: ").await?;
    let country_code = prompt.ask("country code: ").await?;
    let phone = prompt.ask("phone: ").await?;
    let gender = prompt.ask("gender: ").await?;

    let user = NewUser {
        email,
        password,
        user_type,
        degree_code,
        country_code,
        phone,
        first_name,
        last_name,
        gender,
    };
    Ok(api.add_user(&user).await)
}

fn print_help() {
    println!("Commands:");
    println!("  quizzes            list generated quizzes (auto-refreshing)");
    println!("  quiz <n>           show the full content of quiz n");
    println!("  users              list registered users (auto-refreshing)");
    println!("  generate <topic>   generate and save a quiz for a course topic");
    println!("  retry              re-save a generated quiz whose save failed");
    println!("  status             show the current generation attempt");
    println!("  reset              clear the last generation attempt");
    println!("  refresh            revalidate both lists now");
    println!("  adduser            register a new user");
    println!("  whoami             show the signed-in admin");
    println!("  logout             clear the session and return to sign-in");
    println!("  quit               exit the console");
}
