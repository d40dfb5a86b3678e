use classifier::{ClassifierConfig, ClassifierError, ModelStore, WeatherClassifier};
use features::FeatureConfig;
use image::{DynamicImage, Rgb, RgbImage};
use weather_common::WeatherClass;

fn scene(class: WeatherClass, variant: u32) -> DynamicImage {
    let img = RgbImage::from_fn(48, 40, |x, y| {
        let jitter = ((x * 13 + y * 7 + variant * 29) % 11) as u8;
        match class {
            WeatherClass::Cerah => {
                if y < 28 {
                    Rgb([60 + jitter, 130 + jitter, 235])
                } else {
                    Rgb([70, 150 + jitter, 60])
                }
            }
            WeatherClass::Berawan => {
                let puff = if (x / 8 + y / 6 + variant) % 2 == 0 { 40 } else { 0 };
                Rgb([170 + puff + jitter, 175 + puff + jitter, 185 + puff])
            }
            WeatherClass::Hujan => {
                let streak = if (x + 2 * y + variant) % 6 == 0 { 60 } else { 0 };
                Rgb([55 + streak + jitter, 60 + streak + jitter, 70 + streak])
            }
            WeatherClass::Berkabut => {
                let v = 200 + (y / 10) as u8 + jitter / 3;
                Rgb([v, v, v])
            }
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn training_set() -> (Vec<DynamicImage>, Vec<WeatherClass>) {
    let mut images = Vec::new();
    let mut labels = Vec::new();
    for class in WeatherClass::ALL {
        for variant in 0..4 {
            images.push(scene(class, variant));
            labels.push(class);
        }
    }
    (images, labels)
}

fn fitted() -> WeatherClassifier {
    let (images, labels) = training_set();
    let mut model =
        WeatherClassifier::new(ClassifierConfig::default(), FeatureConfig::new(32, 32).unwrap())
            .unwrap();
    model.fit(&images, &labels).unwrap();
    model
}

#[test]
fn test_save_and_reload_gives_identical_probabilities() {
    let model = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models").join("weather.model");
    model.save(&path).unwrap();

    let reloaded = WeatherClassifier::load(&path).unwrap();
    assert_eq!(reloaded.fitted(), model.fitted());
    assert_eq!(reloaded.feature_config(), model.feature_config());

    let probe = vec![scene(WeatherClass::Cerah, 9), scene(WeatherClass::Hujan, 7)];
    assert_eq!(
        model.predict_proba(&probe).unwrap(),
        reloaded.predict_proba(&probe).unwrap()
    );
    assert_eq!(model.predict(&probe).unwrap(), reloaded.predict(&probe).unwrap());
}

#[test]
fn test_confidences_cover_all_classes() {
    let model = fitted();
    let confidences = model.confidences(&scene(WeatherClass::Berkabut, 5)).unwrap();
    assert_eq!(confidences.len(), WeatherClass::COUNT);
    assert!((confidences.total() - 100.0).abs() < 0.05);
    let percents: Vec<f64> = confidences.iter().map(|c| c.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_store_serves_reloaded_model() {
    let model = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weather.model");
    model.save(&path).unwrap();

    let store = ModelStore::load_or_degraded(&path);
    let active = store.current().unwrap();
    assert!(active.is_fitted());

    std::fs::write(&path, b"truncated").unwrap();
    assert!(matches!(
        store.try_load(&path),
        Err(ClassifierError::ModelLoadFailure { .. })
    ));
    assert!(store.is_available());
}

#[test]
fn test_unfitted_prediction_fails() {
    let model =
        WeatherClassifier::new(ClassifierConfig::default(), FeatureConfig::new(32, 32).unwrap())
            .unwrap();
    assert!(matches!(
        model.predict(&[scene(WeatherClass::Cerah, 0)]),
        Err(ClassifierError::NotFitted)
    ));
}
