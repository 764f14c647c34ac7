//! Minimum-cost segmentation search.
//!
//! Depth-first over the pattern lists with an explicit frame stack, so deep
//! passwords never touch the call stack. Every complete cover is priced with
//! fresh coders and the cheapest one wins; ties go to the cover found first.

use std::time::Instant;

use super::encoder::{EntropyEncoder, MultiEntropyEncoder};
use super::patterns::{PATTERN_TAGS, PatternClass, PatternInstance};

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub min_cost: f64,
    pub path: Vec<PatternInstance>,
    pub paths_evaluated: u64,
    pub budget_exhausted: bool,
}

/// Total description length of one complete cover of `password`.
pub fn path_cost(password: &[char], path: &[PatternInstance]) -> f64 {
    path_cost_with(password, path, &MultiEntropyEncoder::for_char_classes())
}

fn path_cost_with(
    password: &[char],
    path: &[PatternInstance],
    data_proto: &MultiEntropyEncoder,
) -> f64 {
    let mut tags = EntropyEncoder::new(PATTERN_TAGS.chars().collect(), 0, 1, 0);
    let mut data = data_proto.clone();
    let mut raw = 0.0;

    for pi in path {
        tags.write(pi.class.tag());
        let coded = match pi.class {
            PatternClass::Single(class) => data.write(class, password[pi.start]),
            _ => false,
        };
        if !coded {
            raw += pi.cost;
        }
    }
    tags.output_size() + raw + data.output_size()
}

struct Frame {
    pos: usize,
    next_alt: usize,
}

/// Explore covers until done or until `deadline` passes.
///
/// When nothing completed in time the all-single-characters cover is
/// returned; it is always valid and bounds the true minimum from above.
pub fn search(
    password: &[char],
    patterns: &[Vec<PatternInstance>],
    deadline: Instant,
) -> SearchOutcome {
    let n = password.len();
    let data_proto = MultiEntropyEncoder::for_char_classes();

    let mut best: Option<(f64, Vec<PatternInstance>)> = None;
    let mut paths_evaluated = 0u64;
    let mut budget_exhausted = false;

    let mut frames = vec![Frame { pos: 0, next_alt: 0 }];
    let mut path: Vec<PatternInstance> = Vec::with_capacity(n);

    loop {
        if Instant::now() >= deadline {
            budget_exhausted = true;
            break;
        }
        let Some(top) = frames.last_mut() else {
            break;
        };

        if top.pos >= n {
            let cost = path_cost_with(password, &path, &data_proto);
            paths_evaluated += 1;
            if best.as_ref().is_none_or(|(c, _)| cost < *c) {
                best = Some((cost, path.clone()));
            }
            frames.pop();
            path.pop();
            continue;
        }

        let alts = &patterns[top.pos];
        if top.next_alt >= alts.len() {
            frames.pop();
            path.pop();
            continue;
        }
        let pi = alts[top.next_alt];
        top.next_alt += 1;
        path.push(pi);
        frames.push(Frame {
            pos: pi.start + pi.length,
            next_alt: 0,
        });
    }

    let (min_cost, path) = best.unwrap_or_else(|| {
        let singles: Vec<PatternInstance> =
            patterns.iter().filter_map(|alts| alts.first().copied()).collect();
        (path_cost_with(password, &singles, &data_proto), singles)
    });

    SearchOutcome {
        min_cost,
        path,
        paths_evaluated,
        budget_exhausted,
    }
}
