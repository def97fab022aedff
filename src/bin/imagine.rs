//! CLI for Imagine - prompt-driven image editing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use imagine::{
    Controller, EncodedImage, EntryId, GeminiEditor, GeminiModel, ImageEditor, Language, Phase,
    Strings, SubmitBlocker, SubmitOutcome,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "imagine")]
#[command(about = "Edit images with a text instruction via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    editor: EditorArgs,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Args)]
struct EditorArgs {
    /// Gemini API key (defaults to GOOGLE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini image model
    #[arg(long, value_enum, global = true, default_value = "flash")]
    model: ModelArg,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image once and save the result
    Edit(EditArgs),

    /// Print the UI strings for a language
    Strings {
        /// Language tag (en, ar, fr)
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },

    /// Start an interactive editing session on stdin
    Session {
        /// Language tag (en, ar, fr)
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },

    /// Check that the API key and model are usable
    Check,
}

#[derive(Args)]
struct EditArgs {
    /// Path of the image to edit
    input: PathBuf,

    /// Edit instruction (defaults to the language's default prompt)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Language tag (en, ar, fr)
    #[arg(short, long, default_value = "en")]
    lang: Language,

    /// Output file path (defaults to imagine-with-abdo.<ext> for the result's format)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::FlashImage,
            ModelArg::Pro => GeminiModel::ProImage,
        }
    }
}

impl EditorArgs {
    fn build(&self) -> imagine::Result<GeminiEditor> {
        let mut builder = GeminiEditor::builder().model(self.model.into());
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => {
            edit_once(args, &cli.editor, cli.json).await?;
        }
        Commands::Strings { lang } => {
            print_strings(lang, cli.json)?;
        }
        Commands::Session { lang } => {
            run_session(lang, &cli.editor).await?;
        }
        Commands::Check => {
            let editor = cli.editor.build()?;
            editor.health_check().await?;
            println!("{}: OK ({})", editor.name(), editor.model().as_str());
        }
    }

    Ok(())
}

async fn edit_once(args: EditArgs, editor: &EditorArgs, json_output: bool) -> anyhow::Result<()> {
    let mut session = Controller::new(editor.build()?, args.lang);

    let upload = EncodedImage::from_file(&args.input)?;
    session.load_image(upload.data, upload.mime_type);
    if let Some(prompt) = args.prompt {
        session.set_prompt(prompt);
    }

    if let Some(blocker) = session.submit_blocker() {
        anyhow::bail!(describe_blocker(blocker, session.strings()));
    }
    let id = match session.submit_edit().await {
        SubmitOutcome::Succeeded(id) => id,
        SubmitOutcome::Failed(message) => anyhow::bail!(message),
        SubmitOutcome::Skipped => anyhow::bail!("edit skipped"),
    };

    let state = session.state();
    let Some(result) = state.result_image else {
        anyhow::bail!("edit finished without a result image");
    };
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(result.export_file_name()));
    result.save(&output)?;

    if json_output {
        let summary = serde_json::json!({
            "success": true,
            "id": id,
            "phase": state.phase,
            "output": output.display().to_string(),
            "size_bytes": result.size(),
            "mime_type": result.mime_type,
            "prompt": state.prompt,
            "language": state.language,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{}: {} ({} bytes, {})",
            session.strings().result,
            output.display(),
            result.size(),
            result.mime_type
        );
    }

    Ok(())
}

fn print_strings(lang: Language, json_output: bool) -> anyhow::Result<()> {
    let strings = imagine::strings_for(lang);
    if json_output {
        let mut map = serde_json::Map::new();
        for (key, text) in strings.entries() {
            map.insert(key.to_string(), text.into());
        }
        map.insert(
            "default_prompt".to_string(),
            imagine::default_prompt_for(lang).into(),
        );
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        for (key, text) in strings.entries() {
            println!("{key:>14}  {text}");
        }
        println!("{:>14}  {}", "default_prompt", imagine::default_prompt_for(lang));
    }
    Ok(())
}

const SESSION_HELP: &str = "\
commands:
  load <path>         upload an image
  prompt <text>       replace the instruction
  lang <en|ar|fr>     switch language (resets the prompt)
  edit                run the edit
  history             list past edits, newest first
  restore <n|id>      bring a past edit back
  reset               clear the current images
  save [path]         export the current result
  state               show the current state
  help                show this message
  quit                leave the session";

async fn run_session(lang: Language, editor: &EditorArgs) -> anyhow::Result<()> {
    let mut session = Controller::new(editor.build()?, lang);

    // Render phase changes as they happen, including mid-request.
    let mut rx = session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last = rx.borrow_and_update().state.phase;
        while rx.changed().await.is_ok() {
            let phase = rx.borrow_and_update().state.phase;
            if phase != last {
                eprintln!("[{phase}]");
                last = phase;
            }
        }
    });

    println!("{}", session.strings().title);
    println!("{SESSION_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{SESSION_HELP}"),
            "load" => match EncodedImage::from_file(rest) {
                Ok(upload) => {
                    session.load_image(upload.data, upload.mime_type);
                    println!("{}", session.strings().success);
                }
                Err(e) => eprintln!("error: {e}"),
            },
            "prompt" => session.set_prompt(rest),
            "lang" => match rest.parse::<Language>() {
                Ok(lang) => {
                    session.set_language(lang);
                    println!("{}: {}", session.strings().prompt, session.state().prompt);
                }
                Err(e) => eprintln!("error: {e}"),
            },
            "edit" => {
                if let Some(blocker) = session.submit_blocker() {
                    eprintln!("error: {}", describe_blocker(blocker, session.strings()));
                    continue;
                }
                match session.submit_edit().await {
                    SubmitOutcome::Succeeded(id) => println!("{}: {id}", session.strings().result),
                    SubmitOutcome::Failed(message) => eprintln!("error: {message}"),
                    SubmitOutcome::Skipped => {}
                }
            }
            "history" => {
                let history = session.history();
                if history.is_empty() {
                    println!("(empty)");
                }
                for (index, entry) in history.list().enumerate() {
                    println!(
                        "{index:>3}  {}  {}  {}",
                        entry.id(),
                        entry.created_at().format("%H:%M:%S"),
                        entry.prompt()
                    );
                }
            }
            "restore" => {
                let id = match rest.parse::<usize>() {
                    Ok(index) => session.history().get(index).map(|e| e.id()),
                    Err(_) => rest.parse::<EntryId>().ok(),
                };
                if id.is_some_and(|id| session.restore_from_history(id)) {
                    print_state(&session);
                } else {
                    eprintln!("error: no history entry '{rest}'");
                }
            }
            "reset" => session.reset(),
            "save" => {
                let Some(result) = session.state().result_image else {
                    eprintln!("error: no result to save");
                    continue;
                };
                let path = if rest.is_empty() {
                    PathBuf::from(result.export_file_name())
                } else {
                    PathBuf::from(rest)
                };
                match result.save(&path) {
                    Ok(()) => println!("{}", path.display()),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "state" => print_state(&session),
            other => eprintln!("unknown command '{other}', try 'help'"),
        }
    }

    drop(session);
    watcher.await?;
    Ok(())
}

fn describe_blocker(blocker: SubmitBlocker, strings: &Strings) -> String {
    match blocker {
        SubmitBlocker::Busy => "an edit is already running".to_string(),
        SubmitBlocker::NoImage => strings.no_image_sub.to_string(),
        SubmitBlocker::EmptyPrompt => {
            format!("the prompt is empty, try: {}", strings.placeholder)
        }
    }
}

fn print_state(session: &Controller<GeminiEditor>) {
    let state = session.state();
    let strings = session.strings();
    let describe = |image: &Option<std::sync::Arc<EncodedImage>>| match image {
        Some(image) => format!("{} bytes, {}", image.size(), image.mime_type),
        None => strings.no_image.to_string(),
    };

    println!("language: {}", state.language);
    println!("phase:    {}", state.phase);
    println!("{}: {}", strings.source, describe(&state.source_image));
    println!("{}: {}", strings.result, describe(&state.result_image));
    println!("{}: {}", strings.prompt, state.prompt);
    if state.phase == Phase::Failed {
        if let Some(ref error) = state.last_error {
            println!("error:    {error}");
        }
    }
}
