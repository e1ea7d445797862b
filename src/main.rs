use log::error;
use recipe_extract::{ExtractError, ExtractorConfig, ImageSource, RecipeExtractor, SourceType};
use std::env;
use std::path::PathBuf;

const USAGE: &str = "Usage:
  recipe-extract <url>
  recipe-extract --text <file>
  recipe-extract --pdf-text <file>
  recipe-extract --image <path> [<path>...]";

enum Command {
    Url(String),
    Text(PathBuf, SourceType),
    Images(Vec<PathBuf>),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let first = args.get(1).ok_or(USAGE)?;
    match first.as_str() {
        "--text" | "--pdf-text" => {
            let path = args.get(2).ok_or(USAGE)?;
            let source_type = if first == "--pdf-text" {
                SourceType::Pdf
            } else {
                SourceType::Ocr
            };
            Ok(Command::Text(PathBuf::from(path), source_type))
        }
        "--image" => {
            let paths: Vec<PathBuf> = args[2..].iter().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(USAGE.to_string());
            }
            Ok(Command::Images(paths))
        }
        "-h" | "--help" => Err(USAGE.to_string()),
        url => Ok(Command::Url(url.to_string())),
    }
}

async fn run(command: Command) -> Result<String, ExtractError> {
    let extractor = RecipeExtractor::new(ExtractorConfig::load()?)?;
    let recipe = match command {
        Command::Url(url) => extractor.extract_from_url(&url).await?,
        Command::Text(path, source_type) => {
            let text = tokio::fs::read_to_string(&path).await?;
            extractor.extract_from_text(&text, source_type).await?
        }
        Command::Images(paths) => {
            let images: Vec<ImageSource> = paths.into_iter().map(ImageSource::Path).collect();
            extractor.extract_from_images(&images).await?
        }
    };

    serde_json::to_string_pretty(&recipe)
        .map_err(|e| ExtractError::InvalidInput(format!("could not serialize recipe: {e}")))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    match run(command).await {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Extraction failed: {}", e);
            eprintln!("Error: {}", e);
            // extraction errors already carry their hint in the message
            if let (Some(hint), false) = (e.hint(), matches!(e, ExtractError::Extraction { .. })) {
                eprintln!("Hint: {}", hint);
            }
            std::process::exit(1);
        }
    }
}
