use pc_space::*;
use pc_types::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Pipeline configuration space example");

    let space = default_pipeline_space()?;
    println!("Built space with {} hyperparameters", space.len());

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let samples = space.sample(3, &mut rng)?;
    for config in &samples {
        println!("Sampled {config}");
        println!("  encoded: {:?}", space.to_vector(config));
    }

    // Keep the preprocessing of the first sample, take the classifier of the second.
    let steps = PipelineStepSet::new(["imputation", "feature_preprocessor"], ["classifier"])?;
    let mut values = BTreeMap::new();
    for (key, value) in samples[0].iter() {
        if steps.role_of(key) == StepRole::Constant {
            values.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in samples[1].iter() {
        if steps.role_of(key) == StepRole::Variable {
            values.insert(key.clone(), value.clone());
        }
    }

    match space.configuration(values) {
        Ok(combined) => println!("Recombined {combined}"),
        Err(e) => println!("Recombination rejected: {e}"),
    }

    Ok(())
}
