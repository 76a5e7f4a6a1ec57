use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::controller::{FieldKey, FormId};
use super::value::FieldValue;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStrategy {
    #[default]
    RandomFraction,
    Sequential,
}

pub(super) fn generate_names(
    keys: &[FieldKey],
    strategy: NameStrategy,
    form_id: FormId,
) -> BTreeMap<FieldKey, String> {
    match strategy {
        NameStrategy::RandomFraction => {
            let mut rng = rand::thread_rng();
            keys.iter()
                .map(|key| (*key, fraction_digits(rng.r#gen::<f64>())))
                .collect()
        }
        NameStrategy::Sequential => keys
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, format!("{}-{index}", form_id.0)))
            .collect(),
    }
}

pub(super) fn fraction_digits(value: f64) -> String {
    let rendered = value.to_form_string();
    match rendered.split_once('.') {
        Some((_, fraction)) => fraction.to_string(),
        None => rendered,
    }
}
