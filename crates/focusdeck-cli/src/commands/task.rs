use clap::Subcommand;

use focusdeck_core::storage::Database;
use focusdeck_core::sync::keyring_store;
use focusdeck_core::{ApiError, Config, Priority, Task, TaskApiClient};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task text
        text: String,
        /// Priority: low, medium, or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,
    },
    /// List tasks
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as done
    Done {
        /// Task id
        id: String,
    },
    /// Remove a task
    Remove {
        /// Task id
        id: String,
    },
    /// Sync the task list with the remote collection
    Sync {
        #[command(subcommand)]
        direction: SyncDirection,
    },
    /// Delete every task on the server
    ClearRemote,
}

#[derive(Subcommand)]
pub enum SyncDirection {
    /// Replace the remote collection with the local table
    Push,
    /// Replace the local table with the remote collection
    Pull,
}

fn api_client() -> Result<TaskApiClient, Box<dyn std::error::Error>> {
    let token = keyring_store::get("api_token")?.ok_or(ApiError::NotAuthenticated)?;
    let config = Config::load_or_default();
    Ok(TaskApiClient::new(&config.sync.base_url, token)?)
}

fn runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TaskAction::Add {
            text,
            priority,
            tag,
        } => {
            let mut task = Task::new(text);
            task.priority = Priority::parse_or_default(&priority);
            task.tags = tag;
            db.upsert_task(&task)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { json } => {
            let tasks = db.list_tasks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in tasks {
                    let mark = if task.completed { "x" } else { " " };
                    let tags = if task.tags.is_empty() {
                        String::new()
                    } else {
                        format!("  #{}", task.tags.join(" #"))
                    };
                    println!(
                        "[{mark}] {}  {} ({}){tags}",
                        task.id,
                        task.text,
                        task.priority.as_str()
                    );
                }
            }
        }
        TaskAction::Done { id } => {
            if db.complete_task(&id, chrono::Utc::now())? {
                println!("done");
            } else {
                eprintln!("no task with id {id}");
                std::process::exit(1);
            }
        }
        TaskAction::Remove { id } => {
            if db.remove_task(&id)? {
                println!("removed");
            } else {
                eprintln!("no task with id {id}");
                std::process::exit(1);
            }
        }
        TaskAction::Sync { direction } => {
            let client = api_client()?;
            let rt = runtime()?;
            match direction {
                SyncDirection::Push => {
                    let tasks = db.list_tasks()?;
                    let summary = rt.block_on(client.replace_all(&tasks))?;
                    println!("pushed {} task(s)", summary.count);
                }
                SyncDirection::Pull => {
                    let tasks = rt.block_on(client.fetch_all())?;
                    db.replace_all_tasks(&tasks)?;
                    println!("pulled {} task(s)", tasks.len());
                }
            }
        }
        TaskAction::ClearRemote => {
            let client = api_client()?;
            let rt = runtime()?;
            rt.block_on(client.clear_remote())?;
            println!("remote tasks cleared");
        }
    }
    Ok(())
}
