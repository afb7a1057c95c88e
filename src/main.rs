use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskdesk::config::AppConfig;
use taskdesk::core::{DEFAULT_LIST_ID, FilterType, SourceType};
use taskdesk::import::{self, AnthropicAnalyzer, ImportItem};
use taskdesk::store::{ListStore, SaveStatus, TodoStore};

/// Log to the systemd user journal (`journalctl --user -t taskdesk -f`).
/// taskdesk targets pass at info/debug (per config), everything else at warn.
fn install_logger(debug: bool) {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("taskdesk") {
                let max = if taskdesk::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    taskdesk::set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("taskdesk".to_string()),
        Err(e) => {
            eprintln!("journal logging unavailable: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so taskdesk debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show,
    Add(String),
    Done(String),
    Remove(String),
    Edit(String, String),
    Import(PathBuf),
    Lists,
    NewList {
        name: String,
        color: String,
        icon: Option<String>,
    },
    RemoveList(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    filter: FilterType,
    search: Option<String>,
    command: Command,
}

const USAGE: &str = "usage: taskdesk [--today|--important|--planned] [--search TERM] \
[add TEXT | done ID | rm ID | edit ID TEXT | import FILE | lists | new-list NAME COLOR [ICON] | rm-list ID]";

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut filter = FilterType::All;
    let mut search = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--today" => filter = FilterType::MyDay,
            "--important" => filter = FilterType::Important,
            "--planned" => filter = FilterType::Planned,
            "--search" => {
                search = Some(iter.next().ok_or("--search needs a term")?.clone());
            }
            _ => rest.push(arg.clone()),
        }
    }

    let command = match rest.as_slice() {
        [] => Command::Show,
        [cmd, words @ ..] if cmd == "add" && !words.is_empty() => Command::Add(words.join(" ")),
        [cmd, id] if cmd == "done" => Command::Done(id.clone()),
        [cmd, id] if cmd == "rm" => Command::Remove(id.clone()),
        [cmd, id, words @ ..] if cmd == "edit" && !words.is_empty() => {
            Command::Edit(id.clone(), words.join(" "))
        }
        [cmd, file] if cmd == "import" => Command::Import(PathBuf::from(file)),
        [cmd] if cmd == "lists" => Command::Lists,
        [cmd, name, color, icon @ ..] if cmd == "new-list" && icon.len() <= 1 => Command::NewList {
            name: name.clone(),
            color: color.clone(),
            icon: icon.first().cloned(),
        },
        [cmd, id] if cmd == "rm-list" => Command::RemoveList(id.clone()),
        _ => return Err(USAGE.to_string()),
    };

    Ok(Options {
        filter,
        search,
        command,
    })
}

fn report(action: &str, status: SaveStatus) {
    match status {
        SaveStatus::Unchanged => println!("{}: nothing to do", action),
        SaveStatus::Failed(e) => eprintln!("{}: kept in memory but not saved ({})", action, e),
        SaveStatus::Saved | SaveStatus::ViewOnly | SaveStatus::Loaded => {}
    }
}

async fn import_file(
    todos: &mut TodoStore,
    config: &AppConfig,
    path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "txt" | "md" | "markdown"));

    let (items, source) = if is_text {
        let text = tokio::fs::read_to_string(&path).await?;
        let items: Vec<ImportItem> = import::parse_tasks(&text).into_iter().map(ImportItem::from).collect();
        (items, SourceType::Text)
    } else {
        let analyzer = AnthropicAnalyzer::new(config.api_key.clone());
        import::analyzer::analyze_file(&analyzer, &path).await?
    };

    if items.is_empty() {
        println!("No tasks found in {}", path.display());
        return Ok(());
    }
    let count = items.len();
    report("import", todos.add_todos(items, source).await);
    println!("Imported {} tasks", count);
    Ok(())
}

/// Delete a list and move its tasks to the default list.
async fn remove_list(
    lists: &mut ListStore,
    todos: &mut TodoStore,
    id: &str,
) -> Vec<(&'static str, SaveStatus)> {
    let status = lists.delete_list(id).await;
    if !status.changed() {
        return vec![("rm-list", status)];
    }
    let moved = todos.reassign_list(id, DEFAULT_LIST_ID).await;
    vec![("rm-list", status), ("reassign", moved)]
}

fn render(todos: &TodoStore, lists: &ListStore) {
    let known: Vec<&str> = lists.lists().iter().map(|l| l.id.as_str()).collect();
    println!("== {} ==", todos.filter().title());
    for todo in todos.filtered_todos() {
        let mark = if todo.completed { "x" } else { " " };
        let list_id = if known.contains(&todo.list_id.as_str()) {
            todo.list_id.as_str()
        } else {
            DEFAULT_LIST_ID
        };
        let list = lists.list_by_id(list_id).map(|l| l.name.as_str()).unwrap_or("");
        println!("[{}] {}  ({}, {})", mark, todo.text, list, todo.id);
    }
    let counts = todos.counts();
    println!("{} active, {} completed", counts.active, counts.completed);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();
    install_logger(config.debug_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    let mut lists = ListStore::new(config.storage());
    let mut todos = TodoStore::new(config.storage());

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    let subscription = todos.on_change(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    lists.init().await;
    todos.init().await;
    todos.set_filter(options.filter);
    if let Some(term) = options.search {
        todos.set_search_term(term);
    }

    match options.command {
        Command::Show => {}
        Command::Add(text) => report("add", todos.add_todo(&text).await),
        Command::Done(id) => report("done", todos.toggle_todo_completion(&id).await),
        Command::Remove(id) => report("rm", todos.delete_todo(&id).await),
        Command::Edit(id, text) => report("edit", todos.update_todo_text(&id, &text).await),
        Command::Import(path) => import_file(&mut todos, &config, path).await?,
        Command::Lists => {
            for list in lists.lists() {
                let marker = if list.id == lists.selected_list_id() { "*" } else { " " };
                println!(
                    "{} {} {} ({}, {})",
                    marker,
                    list.icon.as_deref().unwrap_or(" "),
                    list.name,
                    list.color,
                    list.id
                );
            }
            return Ok(());
        }
        Command::NewList { name, color, icon } => {
            let (list, status) = lists.add_list(&name, &color, icon).await;
            report("new-list", status);
            println!("Created list {} ({})", list.name, list.id);
            return Ok(());
        }
        Command::RemoveList(id) => {
            for (action, status) in remove_list(&mut lists, &mut todos, &id).await {
                report(action, status);
            }
        }
    }

    log::debug!("{} change notifications", changes.load(Ordering::Relaxed));
    subscription.unsubscribe();
    render(&todos, &lists);
    Ok(())
}
