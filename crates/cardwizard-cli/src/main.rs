use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cardwizard_contracts::creature::{catalog_color, ColorHarmony, CreatureData, COLOR_CATALOG};
use cardwizard_contracts::wizard::{AdvanceOutcome, AppStep, InputKind, InterviewMachine};
use cardwizard_engine::{CardImage, CardStudio, EditOutcome, GenerateOutcome, WizardSession};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cardwizard", version, about = "Sketch-to-trading-card wizard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive wizard: upload, interview, colors, card, edits.
    Wizard(WizardArgs),
    /// One-shot generation from a creature JSON file and a sketch image.
    Generate(GenerateArgs),
    /// One-shot edit of an existing card image.
    Edit(EditArgs),
}

#[derive(Debug, Parser)]
struct WizardArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    creature: PathBuf,
    #[arg(long)]
    sketch: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Parser)]
struct EditArgs {
    #[arg(long)]
    card: PathBuf,
    #[arg(long)]
    instruction: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("cardwizard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Wizard(args) => {
            run_wizard(args)?;
            Ok(0)
        }
        Command::Generate(args) => run_generate(args),
        Command::Edit(args) => run_edit(args),
    }
}

fn open_studio(out: &Path, events: Option<PathBuf>, model: Option<String>) -> Result<CardStudio> {
    let events_path = events.unwrap_or_else(|| out.join("events.jsonl"));
    CardStudio::new(out, events_path, model)
}

fn run_wizard(args: WizardArgs) -> Result<()> {
    let mut studio = open_studio(&args.out, args.events, args.model)?;
    let mut session = WizardSession::new();
    let mut interview = InterviewMachine::new();

    println!("CreatureWizard: draw it, snap it, play it.");
    println!("Type 'quit' at any prompt to leave; 'restart' starts over.\n");

    loop {
        match session.step() {
            AppStep::Landing => {
                let Some(line) = prompt_line("Press Enter to start the magic> ")? else {
                    return Ok(());
                };
                match line.trim() {
                    "quit" => return Ok(()),
                    _ => session.begin(),
                }
            }
            AppStep::Upload => {
                if !upload_screen(&mut session, &mut studio)? {
                    return Ok(());
                }
            }
            AppStep::Interview => {
                if !interview_screen(&mut session, &mut interview)? {
                    return Ok(());
                }
            }
            AppStep::Color => {
                if !color_screen(&mut session, &mut studio, &mut interview)? {
                    return Ok(());
                }
            }
            // `render_card` runs synchronously inside the color screen, so
            // the loop never observes the transient generating step.
            AppStep::Generating => unreachable!("generation completes before the loop resumes"),
            AppStep::Result => {
                if !result_screen(&mut session, &mut studio, &mut interview)? {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns `false` when the user quit. `true` keeps the wizard loop going.
fn upload_screen(session: &mut WizardSession, studio: &mut CardStudio) -> Result<bool> {
    println!("Show us your creature! Enter the path to a photo of your drawing.");
    let Some(line) = prompt_line("sketch> ")? else {
        return Ok(false);
    };
    match line.trim() {
        "" => return Ok(true),
        "quit" => return Ok(false),
        "restart" => {
            session.reset();
            return Ok(true);
        }
        _ => {}
    }

    let path = parse_sketch_path(&line);
    let sketch = match encode_sketch(&path) {
        Ok(sketch) => sketch,
        Err(err) => {
            println!("Could not read that image: {err:#}");
            return Ok(true);
        }
    };
    println!("Preview: {}", describe_sketch(&path));

    loop {
        let Some(answer) = prompt_line("Use this drawing? [y/n]> ")? else {
            return Ok(false);
        };
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => {
                session.attach_sketch(sketch.to_data_uri());
                studio.emit_event(
                    "sketch_attached",
                    event_payload(&[("mime", sketch.mime.as_str())]),
                )?;
                println!("Great sketch! Now a few questions.\n");
                return Ok(true);
            }
            "n" | "no" => {
                // Retake: drop the local preview, the file input stays empty.
                println!("No problem, pick another photo.");
                return Ok(true);
            }
            _ => println!("Please answer y or n."),
        }
    }
}

fn interview_screen(session: &mut WizardSession, interview: &mut InterviewMachine) -> Result<bool> {
    if let Some(error) = session.error() {
        println!("! {error}");
    }
    let question = interview.question();
    let (step_no, total) = interview.progress();
    println!("\nStep {step_no}/{total}: {}", question.question);
    println!("  ({})", question.helper);
    if question.kind == InputKind::Select {
        for (idx, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", idx + 1);
        }
    }
    let current = question.field.read(session.creature());
    if !current.is_empty() {
        println!("  [current: {current}]");
    }

    let Some(line) = prompt_line("answer> ")? else {
        return Ok(false);
    };
    let trimmed = line.trim();
    match trimmed {
        "quit" => return Ok(false),
        "restart" => {
            session.reset();
            *interview = InterviewMachine::new();
            return Ok(true);
        }
        "/back" => {
            if !interview.retreat() {
                println!("Already at the first question.");
            }
            return Ok(true);
        }
        _ => {}
    }

    if !trimmed.is_empty() && trimmed != "/next" {
        let answer = if question.kind == InputKind::Select {
            match resolve_select_option(question.options, trimmed) {
                Some(option) => option.to_string(),
                None => {
                    println!("Pick one of the listed elements (name or number).");
                    return Ok(true);
                }
            }
        } else {
            trimmed.to_string()
        };
        interview.record_answer(session.creature_mut(), &answer);
    }

    match interview.advance(session.creature_mut()) {
        AdvanceOutcome::Moved => {}
        AdvanceOutcome::Blocked(message) => println!("! {message}"),
        AdvanceOutcome::Completed => {
            session.finish_interview();
            println!("\nColor Magic! Let's paint your creature.");
        }
    }
    Ok(true)
}

fn color_screen(
    session: &mut WizardSession,
    studio: &mut CardStudio,
    interview: &mut InterviewMachine,
) -> Result<bool> {
    let creature = session.creature();
    println!(
        "\nHarmony: {} (change with 'harmony <Harmonize|Contrast|Surprise Me>')",
        creature.color_harmony
    );
    println!("Selected: {}/3 {:?}", creature.selected_colors.len(), creature.selected_colors);
    println!("Palette: {}", palette_line());
    println!("Toggle a color by name; 'done' creates the card (needs 2 or 3 colors).");

    let Some(line) = prompt_line("color> ")? else {
        return Ok(false);
    };
    let trimmed = line.trim();
    match trimmed {
        "" => return Ok(true),
        "quit" => return Ok(false),
        "restart" => {
            session.reset();
            *interview = InterviewMachine::new();
            return Ok(true);
        }
        "done" => {
            if !session.creature().colors_ready() {
                println!(
                    "Pick 2 or 3 colors first ({} selected).",
                    session.creature().selected_colors.len()
                );
                return Ok(true);
            }
            println!("Summoning creature... mixing {}...", session.creature().selected_colors.join(" and "));
            match session.render_card(studio) {
                GenerateOutcome::Generated => {
                    println!("\nBehold your creation!");
                    if let Some(version) = studio.journal().latest() {
                        if let Some(path) = version.artifact_path.as_deref() {
                            println!("Card image: {path}");
                        }
                    }
                }
                GenerateOutcome::Failed => {
                    // Fail backward: the interview screen shows the banner.
                    *interview = InterviewMachine::new();
                }
            }
            return Ok(true);
        }
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("harmony ") {
        match ColorHarmony::parse(rest) {
            Some(harmony) => session.creature_mut().set_harmony(harmony),
            None => println!("Harmony is one of: Harmonize, Contrast, Surprise Me."),
        }
        return Ok(true);
    }

    match catalog_color(trimmed) {
        Some(spec) => {
            if !session.creature_mut().toggle_color(spec.name) {
                println!("You already have 3 colors. Remove one first.");
            }
        }
        None => println!("No such color in the palette."),
    }
    Ok(true)
}

fn result_screen(
    session: &mut WizardSession,
    studio: &mut CardStudio,
    interview: &mut InterviewMachine,
) -> Result<bool> {
    if session.is_editing() {
        return edit_screen(session, studio);
    }

    println!("\nCommands: edit (magic wand), save (download card), new (start over), quit");
    let Some(line) = prompt_line("card> ")? else {
        return Ok(false);
    };
    match line.trim() {
        "edit" => session.start_edit(),
        "save" => {
            let Some(card) = session.card().cloned() else {
                println!("No card to save yet.");
                return Ok(true);
            };
            let path = studio.save_card(&card, &session.creature().name)?;
            println!("Saved to {}", path.display());
        }
        "new" => {
            session.reset();
            *interview = InterviewMachine::new();
            studio.emit_event("session_reset", event_payload(&[]))?;
        }
        "quit" => return Ok(false),
        "" => {}
        other => println!("Unknown command '{other}'."),
    }
    Ok(true)
}

fn edit_screen(session: &mut WizardSession, studio: &mut CardStudio) -> Result<bool> {
    println!("\nMagic Wand: what would you like to change? (empty line cancels)");
    println!("Example: Make the monster green, Add lightning in the background...");
    let Some(line) = prompt_line("edit> ")? else {
        return Ok(false);
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        session.cancel_edit();
        return Ok(true);
    }
    if trimmed == "quit" {
        return Ok(false);
    }

    session.set_edit_instruction(trimmed);
    println!("Casting transformation...");
    match session.submit_edit(studio) {
        EditOutcome::Applied => {
            println!("Spell applied!");
            if let Some(version) = studio.journal().latest() {
                if let Some(path) = version.artifact_path.as_deref() {
                    println!("Card image: {path}");
                }
            }
        }
        EditOutcome::Failed { alert } => {
            // Blocking acknowledgment, unlike the generate-path banner.
            println!("!! {alert}");
            let _ack = prompt_line("press Enter to continue> ")?;
        }
        EditOutcome::Skipped => {}
    }
    Ok(true)
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let raw = fs::read_to_string(&args.creature)
        .with_context(|| format!("failed reading {}", args.creature.display()))?;
    let mut creature: CreatureData = serde_json::from_str(&raw)
        .with_context(|| format!("invalid creature JSON ({})", args.creature.display()))?;
    let sketch = encode_sketch(&args.sketch)?;
    creature.sketch_base64 = Some(sketch.to_data_uri());

    let mut studio = open_studio(&args.out, args.events, args.model)?;
    let card = studio.generate_card(&creature)?;
    let saved = studio.save_card(&card, &creature.name)?;
    println!("Card saved to {}", saved.display());
    Ok(0)
}

fn run_edit(args: EditArgs) -> Result<i32> {
    let bytes = fs::read(&args.card)
        .with_context(|| format!("failed reading {}", args.card.display()))?;
    let card = CardImage::new(BASE64.encode(bytes), mime_for_path(&args.card));

    let mut studio = open_studio(&args.out, args.events, args.model)?;
    let edited = studio.edit_card(&card, &args.instruction)?;
    let stem = args
        .card
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("card");
    let saved = studio.save_card(&edited, stem)?;
    println!("Edited card saved to {}", saved.display());
    Ok(0)
}

fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = match io::stdin().read_line(&mut line) {
        Ok(read) => read,
        Err(err) if err.kind() == ErrorKind::Interrupted => return Ok(Some(String::new())),
        Err(err) => return Err(err.into()),
    };
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Quoted paths are accepted; unquoted paths with spaces are joined back
/// together rather than rejected.
fn parse_sketch_path(raw: &str) -> PathBuf {
    match shell_words::split(raw) {
        Ok(parts) if !parts.is_empty() => {
            if parts.len() == 1 {
                PathBuf::from(&parts[0])
            } else {
                PathBuf::from(parts.join(" "))
            }
        }
        _ => PathBuf::from(raw.trim()),
    }
}

fn encode_sketch(path: &Path) -> Result<CardImage> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    Ok(CardImage::new(BASE64.encode(bytes), mime_for_path(path)))
}

fn describe_sketch(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("sketch");
    match image::image_dimensions(path) {
        Ok((width, height)) => format!("{name} ({width}x{height})"),
        Err(_) => name.to_string(),
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

fn resolve_select_option(options: &[&'static str], raw: &str) -> Option<&'static str> {
    if let Ok(index) = raw.parse::<usize>() {
        if (1..=options.len()).contains(&index) {
            return Some(options[index - 1]);
        }
        return None;
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .copied()
}

fn palette_line() -> String {
    COLOR_CATALOG
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<&str>>()
        .join(", ")
}

fn event_payload(entries: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
    let mut payload = serde_json::Map::new();
    for (key, value) in entries {
        payload.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }
    payload
}
