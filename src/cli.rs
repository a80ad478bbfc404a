use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "photo-intent",
    version,
    about = "Rule-based interpretation of natural-language photo queries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Classify(ClassifyArgs),
    Entities(EntitiesArgs),
    Rules(RulesArgs),
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long)]
    pub rules_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub explain: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EntitiesArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long)]
    pub rules_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    #[arg(long)]
    pub rules_path: Option<PathBuf>,

    #[arg(long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "fixtures/intent_scenarios.json")]
    pub manifest_path: PathBuf,

    #[arg(long)]
    pub rules_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
