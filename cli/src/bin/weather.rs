use clap::{Parser, Subcommand};
use classifier::{
    ClassificationReport, ModelStore, WeatherClassifier, grid_search, stratified_split,
};
use cli::{WeatherKitConfig, augment_with_flips, list_images, load_dataset, parse_confidence};
use color_eyre::eyre::{Result, bail, eyre};
use features::FeaturePipeline;
use fusion::{FusionEngine, Verdict};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};
use weather_common::{ConfidenceList, utils::ensure_output_dir};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a directory of class sub-directories
    Train {
        /// Dataset root (overrides the configuration)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Where to write the model (overrides the configuration)
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Tune C and gamma with a cross-validated grid search first
        #[arg(long)]
        grid_search: bool,
    },
    /// Classify an image or every image in a directory
    Predict {
        /// Image file or directory
        input: PathBuf,
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Print one JSON object per image
        #[arg(long)]
        json: bool,
    },
    /// Run the decision rules on explicit confidences, e.g. `Cerah=40 Berawan=38`
    Decide {
        #[arg(required = true)]
        confidences: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the feature layout, and the model summary when a model is given
    Inspect {
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Print the JSON schema of the configuration file
        #[arg(long)]
        schema: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WeatherKitConfig::from_file(path)?,
        None => WeatherKitConfig::default(),
    };

    match cli.command {
        Commands::Train { data, model, grid_search } => {
            train(config, data, model, grid_search)?;
        }
        Commands::Predict { input, model, json } => {
            let model = model.unwrap_or_else(|| config.training.model_path.clone());
            predict(&config, &input, &model, json)?;
        }
        Commands::Decide { confidences, json } => {
            decide(&config, &confidences, json)?;
        }
        Commands::Inspect { model, schema } => {
            inspect(&config, model.as_deref(), schema)?;
        }
    }

    Ok(())
}

fn train(
    mut config: WeatherKitConfig,
    data: Option<PathBuf>,
    model: Option<PathBuf>,
    grid: bool,
) -> Result<()> {
    if let Some(root) = data {
        config.dataset.root = root;
    }
    if let Some(path) = model {
        config.training.model_path = path;
    }
    config.training.grid_search |= grid;

    info!("Step 1: loading images");
    let dataset = load_dataset(&config.dataset)?;
    info!("Class counts: {:?}", dataset.class_counts());

    info!("Step 2: stratified train/test split");
    let (train_idx, test_idx) =
        stratified_split(&dataset.labels, config.training.test_fraction, config.classifier.seed)?;
    info!("{} train, {} test", train_idx.len(), test_idx.len());
    let (mut train_images, mut train_labels) = dataset.select(&train_idx);
    let (test_images, test_labels) = dataset.select(&test_idx);

    if config.training.augment {
        info!("Step 3: augmenting the training split");
        (train_images, train_labels) = augment_with_flips(train_images, train_labels);
        info!("Training set after augmentation: {} images", train_images.len());
    }

    info!("Step 4: extracting features");
    let mut classifier = WeatherClassifier::new(config.classifier.clone(), config.features)?;
    let x_train = classifier.extract(&train_images)?;
    drop(train_images);

    if config.training.grid_search {
        info!("Step 5: hyperparameter search");
        let result = grid_search(&x_train, &train_labels, &config.classifier, &config.grid_search)?;
        for point in &result.points {
            info!("  C={:<6} gamma={:<8} accuracy {:.4}", point.c, point.gamma.to_string(), point.score);
        }
        classifier.set_hyperparameters(result.best_c, result.best_gamma)?;
    }

    info!("Step 6: fitting");
    classifier.fit_features(&x_train, &train_labels)?;
    classifier.save(&config.training.model_path)?;

    if test_images.is_empty() {
        warn!("Empty test split, skipping evaluation");
        return Ok(());
    }

    info!("Step 7: evaluating on the held-out split");
    let predicted = classifier.predict(&test_images)?;
    let report = ClassificationReport::new(&test_labels, &predicted);
    println!("{report}");

    if let Some(dir) = &config.training.results_dir {
        ensure_output_dir(dir)?;
        let path = dir.join("classification_report.txt");
        std::fs::write(&path, report.to_string())?;
        info!("Classification report saved to {}", path.display());
    }

    info!("✅ Training completed");
    Ok(())
}

#[derive(Serialize)]
struct Prediction<'a> {
    path: &'a Path,
    confidences: &'a ConfidenceList,
    verdict: &'a Verdict,
}

fn predict(config: &WeatherKitConfig, input: &Path, model_path: &Path, json: bool) -> Result<()> {
    let store = ModelStore::load_or_degraded(model_path);
    let Some(classifier) = store.current() else {
        bail!("No inference available: model {} could not be loaded", model_path.display());
    };

    let paths = if input.is_dir() {
        list_images(input)?
    } else if input.is_file() {
        vec![input.to_path_buf()]
    } else {
        bail!("Invalid path: {}", input.display());
    };
    if paths.is_empty() {
        warn!("No image files found in {}", input.display());
        return Ok(());
    }

    let engine = FusionEngine::new(config.fusion);
    for path in &paths {
        let image = match image::open(path) {
            Ok(image) => image,
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                continue;
            }
        };
        let confidences = classifier.confidences(&image)?;
        let verdict = engine.decide(&confidences);

        if json {
            let record = Prediction { path, confidences: &confidences, verdict: &verdict };
            println!("{}", serde_json::to_string(&record)?);
        } else {
            print_prediction(path, &confidences, &verdict);
        }
    }
    Ok(())
}

fn print_prediction(path: &Path, confidences: &ConfidenceList, verdict: &Verdict) {
    println!("{}", path.display());
    if let Some(top) = confidences.top() {
        println!("  top class : {} ({:.2}%)", top.class, top.percent);
    }
    for entry in confidences.iter() {
        println!("    {:<10}{:>7.2}%", entry.class.name(), entry.percent);
    }
    print_verdict(verdict);
}

fn print_verdict(verdict: &Verdict) {
    println!("  verdict   : {} [{}] via {}", verdict.prediction, verdict.icon_key, verdict.rule);
    println!("  {}", verdict.explanation);
}

fn decide(config: &WeatherKitConfig, args: &[String], json: bool) -> Result<()> {
    let confidences = args
        .iter()
        .map(|arg| parse_confidence(arg))
        .collect::<Result<ConfidenceList, _>>()?;
    let verdict = FusionEngine::new(config.fusion).decide(&confidences);
    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict);
    }
    Ok(())
}

fn inspect(config: &WeatherKitConfig, model: Option<&Path>, schema: bool) -> Result<()> {
    if schema {
        let schema = schemars::schema_for!(WeatherKitConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let pipeline = match model {
        Some(path) => {
            let classifier = WeatherClassifier::load(path)?;
            let fitted = classifier
                .fitted()
                .ok_or_else(|| eyre!("model {} holds no fitted pipeline", path.display()))?;
            println!("Model: {}", path.display());
            println!("  C               : {}", classifier.config().c);
            println!("  gamma           : {} (resolved {:.6})", classifier.config().gamma, fitted.gamma());
            println!("  PCA components  : {}", fitted.n_components());
            println!("  support vectors : {}", fitted.n_support_vectors());
            FeaturePipeline::standard(*classifier.feature_config())?
        }
        None => FeaturePipeline::standard(config.features)?,
    };

    println!("{}", pipeline.info());
    for segment in pipeline.layout().segments {
        println!("  {:<16}offset {:>5}  len {:>5}", segment.name, segment.offset, segment.len);
    }
    Ok(())
}
