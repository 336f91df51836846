// fills a straight wall run with repeated modules of one catalog length

use crate::config::{SCALE_TOLERANCE, WALL_LENGTHS};

/// Ordered set of admissible module lengths.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleCatalog {
    pub lengths: Vec<f32>,
    pub tolerance: f32,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self {
            lengths: WALL_LENGTHS.to_vec(),
            tolerance: SCALE_TOLERANCE,
        }
    }
}

impl ModuleCatalog {
    pub fn fit(&self, target: f32) -> Option<Fit> {
        fit_combination(target, &self.lengths, self.tolerance)
    }
}

/// A combination accepted for a segment, with the stretch needed to close it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fit {
    pub modules: Vec<f32>,
    pub scale: f32,
}

impl Fit {
    pub fn total_length(&self) -> f32 {
        self.modules.iter().sum()
    }
}

/// Picks the catalog length whose rounded multiple lands closest to `target`.
///
/// The multiplier uses round half away from zero. On equal differences the
/// earlier catalog entry wins. Returns the repeated modules and the absolute
/// difference; a multiplier of zero gives an empty combination.
pub fn best_combination(catalog: &[f32], target: f32) -> (Vec<f32>, f32) {
    let mut best_number = None;
    let mut best_multiplier = 0usize;
    let mut min_difference = f32::INFINITY;

    for &number in catalog {
        if number <= 0.0 {
            continue;
        }
        let multiplier = (target / number).round().max(0.0);
        let difference = (target - multiplier * number).abs();

        if difference < min_difference {
            min_difference = difference;
            best_number = Some(number);
            best_multiplier = multiplier as usize;
        }
    }

    match best_number {
        Some(number) => (vec![number; best_multiplier], min_difference),
        None => (Vec::new(), target.abs()),
    }
}

/// Wraps [`best_combination`] with the scale gate.
/// # Returns `None` when nothing fits or the required stretch exceeds `tolerance`
pub fn fit_combination(target: f32, catalog: &[f32], tolerance: f32) -> Option<Fit> {
    if catalog.is_empty() {
        return None;
    }

    let (modules, _) = best_combination(catalog, target);
    if modules.is_empty() {
        return None;
    }

    let total: f32 = modules.iter().sum();
    let scale = target / total;

    if (scale - 1.0).abs() <= tolerance {
        Some(Fit { modules, scale })
    } else {
        None
    }
}
