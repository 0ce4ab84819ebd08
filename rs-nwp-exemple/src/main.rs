use std::io::Write;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};
use rs_nwp_core::model::predictor::{Predictor, DEFAULT_WINDOW};

#[derive(Parser, Debug)]
#[command(name = "rs-nwp-exemple", about = "Predict and generate from the command line")]
struct Args {
    /// Corpus file; .vocab and .model are built next to it on first run
    #[arg(long, default_value = "./data/hamlet.dat")]
    corpus: String,

    /// Context window W
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Seed text
    #[arg(default_value = "Ham. Vpon what")]
    text: String,

    /// Number of predictions to show
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// Number of words to generate
    #[arg(long, default_value_t = 14)]
    steps: usize,

    /// Print the generated sentence at once instead of typing it
    #[arg(long)]
    no_typing: bool,
}

/// Prints `text` one character at a time.
fn type_out(text: &str, delay: Duration) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for c in text.chars() {
        write!(stdout, "{c}")?;
        stdout.flush()?;
        thread::sleep(delay);
    }
    writeln!(stdout)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Builds ./data/hamlet.vocab and ./data/hamlet.model on first run,
    // then loads them directly
    let predictor = Predictor::new(&args.corpus, args.window)?;
    info!(
        "Loaded {} ({} words, window {})",
        args.corpus,
        predictor.vocabulary().len(),
        predictor.window()
    );

    // The pipeline does not reject blank input, the caller does
    if args.text.trim().is_empty() {
        println!("Please enter some text.");
        return Ok(());
    }

    // Top-k next words (fewer if the padding id ranks among them)
    let predictions = predictor.top_k_predictions(&args.text, args.k)?;
    debug!("{} of {} requested predictions for {:?}", predictions.len(), args.k, args.text);
    if predictions.is_empty() {
        println!("Could not predict the next word.");
    } else {
        println!("Top-{} predicted words:", args.k);
        for prediction in &predictions {
            println!("  -> {} (confidence: {:.2})", prediction.word, prediction.probability);
        }
    }

    // Each step feeds the whole text generated so far back into the model
    let sentence = predictor.generate_sentence(&args.text, args.steps)?;
    debug!(
        "Generated {} words in {} steps",
        sentence.split_whitespace().count() - args.text.split_whitespace().count(),
        args.steps
    );
    println!("Generated sentence:");
    if args.no_typing {
        println!("{sentence}");
    } else {
        type_out(&sentence, Duration::from_millis(25))?;
    }

    Ok(())
}
