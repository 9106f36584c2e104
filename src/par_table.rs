//! Par table abstraction describing a slot game (symbols, reel weights, paylines and payouts).
//!
//! For real slot games, a par table is what describes (almost) all the aspects of the slot game:
//! how often each symbol appears on the reels, which lines are scored and how much each run pays.
//! A game folder holds one CSV file for each of those parts:
//!
//! | File            | Columns                          | Notes                                   |
//! |-----------------|----------------------------------|-----------------------------------------|
//! | `weights.csv`   | `symbol,weight`                  | Non-positive weights leave the symbol out |
//! | `paytable.csv`  | `symbol,three,four,five`         | Empty cells pay nothing                 |
//! | `paylines.csv`  | one row index per reel, no header | One payline per line                   |
//!
//! The reel count is the payline length and the visible row count is one past the highest row
//! any payline reads.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use log::info;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};

use crate::{
    error::{EngineError, Result},
    machine::{SlotMachine, SlotMachineConfig},
    payline::{default_paylines, Payline},
    paytable::{default_paytable, Paytable, PaytableEntry, MAX_MATCH, MIN_MATCH},
    reel_strip::{ReelStrip, SymbolWeights},
    rng::{EntropyRandomSource, RandomSource, SeededRandomSource},
    symbol::Symbol,
};

/// Symbol weights of the built-in game.
pub const DEFAULT_SYMBOL_WEIGHTS: [(Symbol, i64); 9] = [
    (Symbol::Orange, 14),
    (Symbol::Grape, 14),
    (Symbol::Bell, 14),
    (Symbol::Bar, 14),
    (Symbol::Seven, 14),
    (Symbol::Diamond, 8),
    (Symbol::Wild, 2),
    (Symbol::Handcuffs, 10),
    (Symbol::Bank, 10),
];
/// Reels of the built-in game.
pub const DEFAULT_REEL_COUNT: usize = 5;
/// Visible rows of the built-in game.
pub const DEFAULT_VISIBLE_ROWS: usize = 4;

/// Utilitary structure for referencing the files needed to load a par table's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParTableFiles {
    weights_file: PathBuf,
    paytable_file: PathBuf,
    paylines_file: PathBuf,
}

impl TryFrom<Vec<PathBuf>> for ParTableFiles {
    type Error = EngineError;

    fn try_from(paths: Vec<PathBuf>) -> Result<ParTableFiles> {
        let mut weights_file = None;
        let mut paytable_file = None;
        let mut paylines_file = None;

        for path in paths {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_owned(),
                None => continue,
            };
            if name.contains("weights") {
                weights_file = Some(path);
            } else if name.contains("paytable") {
                paytable_file = Some(path);
            } else if name.contains("paylines") {
                paylines_file = Some(path);
            }
        }

        let missing = [
            ("weights", weights_file.is_none()),
            ("paytable", paytable_file.is_none()),
            ("paylines", paylines_file.is_none()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .join(", ");

        match (weights_file, paytable_file, paylines_file) {
            (Some(weights_file), Some(paytable_file), Some(paylines_file)) => Ok(ParTableFiles {
                weights_file,
                paytable_file,
                paylines_file,
            }),
            _ => Err(EngineError::Config(format!(
                "missing par table files: {}",
                missing
            ))),
        }
    }
}

impl ParTableFiles {
    /// Finds the par table files among the entries of `folder`.
    pub fn from_folder(folder: impl AsRef<Path>) -> Result<Self> {
        let paths = fs::read_dir(folder.as_ref())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        ParTableFiles::try_from(paths)
    }
}

#[serde_as]
#[derive(Deserialize)]
struct WeightRecord {
    #[serde_as(as = "DisplayFromStr")]
    symbol: Symbol,
    weight: i64,
}

#[serde_as]
#[derive(Deserialize)]
struct PaytableRecord {
    #[serde_as(as = "DisplayFromStr")]
    symbol: Symbol,
    three: Option<u64>,
    four: Option<u64>,
    five: Option<u64>,
}

/// Complete description of a game, from which slot machines are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParTable {
    /// Copies of each symbol on the base strip.
    pub weights: SymbolWeights,
    /// Scored lines, in evaluation order.
    pub paylines: Vec<Payline>,
    /// Multipliers per symbol and run length.
    pub paytable: Paytable,
    /// Number of reels, the length of every payline.
    pub reel_count: usize,
    /// Height of the visible window.
    pub visible_rows: usize,
}

impl Default for ParTable {
    /// The built-in 5×4 game with ten paylines.
    fn default() -> Self {
        Self {
            weights: SymbolWeights::from(DEFAULT_SYMBOL_WEIGHTS),
            paylines: default_paylines(),
            paytable: default_paytable(),
            reel_count: DEFAULT_REEL_COUNT,
            visible_rows: DEFAULT_VISIBLE_ROWS,
        }
    }
}

impl ParTable {
    /// Loads a game from the CSV files of `folder`.
    pub fn from_folder(folder: impl AsRef<Path>) -> Result<Self> {
        let folder = folder.as_ref();
        let table = Self::parse_from_csv(&ParTableFiles::from_folder(folder)?)?;
        info!(
            "Loaded par table from {}: {} reels, {} rows, {} paylines",
            folder.display(),
            table.reel_count,
            table.visible_rows,
            table.paylines.len()
        );
        Ok(table)
    }

    /// Loads a game from the required CSV files.
    pub fn parse_from_csv(files: &ParTableFiles) -> Result<Self> {
        let weights = parse_weights(&files.weights_file)?;
        let paytable = parse_paytable(&files.paytable_file)?;
        let paylines = parse_paylines(&files.paylines_file)?;

        let reel_count = paylines.first().map(Payline::len).unwrap_or(0);
        if let Some(line) = paylines.iter().find(|line| line.len() != reel_count) {
            return Err(EngineError::DimensionMismatch(format!(
                "payline {:?} does not cover {} reels",
                line.rows(),
                reel_count
            )));
        }
        let visible_rows = paylines
            .iter()
            .flat_map(|line| line.rows().iter().copied())
            .max()
            .map(|row| row + 1)
            .unwrap_or(0);

        Ok(ParTable {
            weights,
            paylines,
            paytable,
            reel_count,
            visible_rows,
        })
    }

    /// Builds a machine: one shuffled copy of the base strip per reel, drawn from `rng`, which
    /// the machine then keeps for its spins.
    pub fn build_machine(&self, mut rng: Box<dyn RandomSource>) -> Result<SlotMachine> {
        let base = ReelStrip::build(&self.weights)?;
        let reels = (0..self.reel_count)
            .map(|_| base.shuffled(rng.as_mut()))
            .collect::<Result<Vec<_>>>()?;

        SlotMachine::new(
            SlotMachineConfig {
                reels,
                paylines: self.paylines.clone(),
                paytable: self.paytable.clone(),
                visible_rows: self.visible_rows,
            },
            rng,
        )
    }

    /// Share of the base strip taken by `symbol`, in percent.
    pub fn symbol_share(&self, symbol: Symbol) -> f64 {
        let total: i64 = self.weights.values().filter(|w| **w > 0).sum();
        match self.weights.get(&symbol) {
            Some(weight) if *weight > 0 && total > 0 => *weight as f64 / total as f64 * 100.0,
            _ => 0.0,
        }
    }
}

fn csv_reader(path: &Path, has_headers: bool) -> Result<csv::Reader<fs::File>> {
    Ok(ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(!has_headers)
        .trim(Trim::All)
        .from_path(path)?)
}

fn parse_weights(path: &Path) -> Result<SymbolWeights> {
    let mut weights = SymbolWeights::new();
    for result in csv_reader(path, true)?.deserialize() {
        let record: WeightRecord = result?;
        weights.insert(record.symbol, record.weight);
    }
    Ok(weights)
}

fn parse_paytable(path: &Path) -> Result<Paytable> {
    let mut paytable = Paytable::new();
    for result in csv_reader(path, true)?.deserialize() {
        let record: PaytableRecord = result?;
        let mut entry = PaytableEntry::default();
        for (count, pays) in (MIN_MATCH..=MAX_MATCH).zip([record.three, record.four, record.five])
        {
            if let Some(pays) = pays {
                entry.set(count, pays)?;
            }
        }
        paytable.insert(record.symbol, entry);
    }
    Ok(paytable)
}

fn parse_paylines(path: &Path) -> Result<Vec<Payline>> {
    let mut paylines = vec![];
    for result in csv_reader(path, false)?.deserialize() {
        let rows: Vec<usize> = result?;
        paylines.push(Payline::new(rows));
    }
    Ok(paylines)
}

/// Machine of the built-in game, seeded when `seed` is given and entropy-driven otherwise.
pub fn create_slot_machine(seed: Option<u64>) -> Result<SlotMachine> {
    let rng: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(SeededRandomSource::new(seed)),
        None => Box::new(EntropyRandomSource::new()),
    };
    ParTable::default().build_machine(rng)
}

/// Machine of the built-in game whose strips and spins are fully determined by `seed`.
pub fn create_deterministic_slot_machine(seed: u64) -> Result<SlotMachine> {
    create_slot_machine(Some(seed))
}

impl Display for ParTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>6} {:>8}", "Symbol", "Weight", "Share")?;
        writeln!(f, "{:-<10} {:->6} {:->8}", "", "", "")?;
        for (symbol, weight) in &self.weights {
            writeln!(
                f,
                "{:<10} {:>6} {:>7.2}%",
                symbol,
                weight,
                self.symbol_share(*symbol)
            )?;
        }

        writeln!(f, "{:=<51}", "")?;

        write!(f, "{:<10}", "Pays")?;
        for count in MIN_MATCH..=MAX_MATCH {
            write!(f, " {:>8}", format!("x{}", count))?;
        }
        writeln!(f)?;
        write!(f, "{:-<10}", "")?;
        for _ in MIN_MATCH..=MAX_MATCH {
            write!(f, " {:->8}", "")?;
        }
        writeln!(f)?;
        for (symbol, _) in self.paytable.iter() {
            write!(f, "{:<10}", symbol)?;
            for count in MIN_MATCH..=MAX_MATCH {
                write!(f, " {:>8}", self.paytable.payout_for(*symbol, count))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{:=<51}", "")?;

        write!(f, "{:<10}", "Payline")?;
        for reel in 1..=self.reel_count {
            write!(f, " Reel {:<2}", reel)?;
        }
        writeln!(f)?;
        for (index, line) in self.paylines.iter().enumerate() {
            write!(f, "{:<10}", index + 1)?;
            for row in line.rows() {
                write!(f, " {:^7}", row)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{:=<51}", "")?;
        write!(
            f,
            "{} reels x {} rows, strip length {}",
            self.reel_count,
            self.visible_rows,
            self.weights.values().filter(|w| **w > 0).sum::<i64>()
        )
    }
}

/// Symbol counts per reel of a built machine, for listings.
pub fn reel_symbol_counts(machine: &SlotMachine) -> BTreeMap<Symbol, Vec<usize>> {
    Symbol::ALL
        .iter()
        .map(|symbol| {
            (
                *symbol,
                machine.reels().iter().map(|reel| reel.count(*symbol)).collect(),
            )
        })
        .collect()
}
