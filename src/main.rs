use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lab_synth::{
    CohortBuilder, CohortConfig, DiseaseProfiles, GeneratorConfig, LabGenerator, PatientContext,
};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "lab-synth", version, about = "Synthetic clinical laboratory results")]
struct Cli {
    /// Path to the disease profile JSON document
    #[arg(
        short,
        long,
        env = "LAB_SYNTH_PROFILES",
        default_value = "data/disease_profiles.json"
    )]
    profiles: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the conditions declared in the profile document
    Conditions,
    /// Generate one patient's results and print them as JSON
    Patient {
        /// Condition to generate results for; random when omitted
        #[arg(short, long)]
        condition: Option<String>,
        #[arg(long, default_value = "other")]
        sex: String,
        #[arg(long, default_value_t = 50)]
        age: u32,
        /// Lifestyle factor, repeatable and applied in order
        #[arg(short, long)]
        lifestyle: Vec<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 0.14)]
        missing_panel_prob: f64,
    },
    /// Generate a cohort and write it as Parquet or JSON
    Cohort {
        #[arg(short = 'n', long, default_value_t = 100)]
        size: usize,
        /// Output file; the extension selects the format
        #[arg(short, long, default_value = "cohort.parquet")]
        output: PathBuf,
        /// Restrict to these conditions (repeatable)
        #[arg(short, long)]
        condition: Vec<String>,
        /// Base seed; row i uses seed + i
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 0.14)]
        missing_panel_prob: f64,
        /// Generate rows on all cores
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        progress: bool,
    },
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let profiles = DiseaseProfiles::from_path(&cli.profiles)
        .with_context(|| format!("loading profiles from {}", cli.profiles.display()))?;

    match cli.command {
        Commands::Conditions => {
            for name in profiles.condition_names() {
                println!("{name}");
            }
        }
        Commands::Patient {
            condition,
            sex,
            age,
            lifestyle,
            seed,
            missing_panel_prob,
        } => {
            let mut config =
                GeneratorConfig::default().with_missing_panel_probability(missing_panel_prob);
            config.seed = seed;
            let condition = match condition {
                Some(c) => c,
                None => {
                    let mut rng = rand::rng();
                    profiles
                        .random_condition(&mut rng)
                        .context("profile document declares no conditions")?
                        .to_string()
                }
            };
            let patient = PatientContext::new(sex, age).with_lifestyle(lifestyle);
            info!("Generating {condition} results for {patient}");

            let row = LabGenerator::new(&profiles, config)?.generate(&condition, &patient)?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        Commands::Cohort {
            size,
            output,
            condition,
            seed,
            missing_panel_prob,
            parallel,
            progress,
        } => {
            let mut config = CohortConfig::new(size)
                .with_conditions(condition)
                .with_progress(progress);
            config.omission.probability = missing_panel_prob;
            config.base_seed = seed;
            info!("{config}");

            let builder = CohortBuilder::new(&profiles).with_config(config);
            let cohort = if parallel {
                builder.build_parallel()?
            } else {
                builder.build()?
            };
            for (condition, count) in cohort.condition_counts() {
                info!("  {condition}: {count}");
            }
            write_output(&cohort, &output)?;
        }
    }
    Ok(())
}

fn write_output(cohort: &lab_synth::Cohort, output: &Path) -> Result<()> {
    match output.extension().and_then(|e| e.to_str()) {
        Some("parquet") => cohort.write_parquet(output)?,
        Some("json") => cohort.write_json(output)?,
        other => bail!("unsupported output format {other:?}, use .parquet or .json"),
    }
    Ok(())
}
