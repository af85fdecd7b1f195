use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use dsgen_core::{RowFormat, RowRange, Table};

use crate::errors::ProducerError;
use crate::producer::{GenerationRequest, RowGroup, RowGroups, RowProducer};

const MAX_CHILDREN_PER_ROW: u32 = 3;
const BUSINESS_KEY_LEN: usize = 16;

/// Deterministic placeholder producer.
///
/// Every row is derived from `(seed, table, row number)` alone, so any shard
/// of a table regenerates exactly the rows a full run would. Values are
/// synthetic and carry no benchmark semantics.
#[derive(Debug, Clone)]
pub struct SyntheticRowProducer {
    seed: u64,
    scale: f64,
    format: RowFormat,
}

impl SyntheticRowProducer {
    pub fn new(seed: u64, scale: f64, format: RowFormat) -> Self {
        Self {
            seed,
            scale,
            format,
        }
    }

    /// Resolve an unbounded range to the end of the table.
    fn effective_range(&self, table: Table, range: RowRange) -> RowRange {
        if range.is_unbounded() {
            RowRange::new(range.start, table.row_count(self.scale))
        } else {
            range
        }
    }

    fn group(&self, table: Table, row: u64, with_children: bool) -> RowGroup {
        let table_seed = hash_seed(self.seed, table.name());
        let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(table_seed, row));

        let parent = self.format.format(&[
            row.to_string(),
            business_key(&mut rng),
            rng.random_range(2_450_815..=2_453_005_u32).to_string(),
            amount(&mut rng),
        ]);

        let mut children = Vec::new();
        if with_children && table.has_child() {
            let count = rng.random_range(0..=MAX_CHILDREN_PER_ROW);
            for index in 1..=count {
                children.push(self.format.format(&[
                    row.to_string(),
                    index.to_string(),
                    rng.random_range(1..=35_u32).to_string(),
                    amount(&mut rng),
                ]));
            }
        }

        RowGroup {
            row_number: row,
            parent,
            children,
        }
    }
}

impl RowProducer for SyntheticRowProducer {
    fn produce<'a>(&'a self, request: &GenerationRequest) -> RowGroups<'a> {
        let table = request.source_table();
        let range = self.effective_range(table, request.range);
        if range.start == 0 && !range.is_empty() {
            return Box::new(std::iter::once(Err(ProducerError::InvalidRange {
                table: request.table,
                range: request.range,
            })));
        }
        let with_children = request.includes_children();
        Box::new(
            range
                .iter()
                .map(move |row| Ok(self.group(table, row, with_children))),
        )
    }
}

fn business_key(rng: &mut impl Rng) -> String {
    (0..BUSINESS_KEY_LEN)
        .map(|_| char::from(b'A' + rng.random_range(0..16_u8)))
        .collect()
}

fn amount(rng: &mut impl Rng) -> String {
    let cents = rng.random_range(100..=2_000_000_u64);
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_row_seed(table_seed: u64, row: u64) -> u64 {
    let hash = table_seed ^ row.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}
