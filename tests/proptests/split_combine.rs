//! Property tests for split/bind workflows

use std::fs;

use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use tempfile::TempDir;

use horcrux::domain::SplitConfig;
use horcrux::gf256::LagrangeWeights;
use horcrux::splitter::Dealer;
use horcrux::stream::StreamOptions;
use horcrux::{HorcruxError, bind_with, split_with};

/// Wrapper for valid share count and threshold pairs
#[derive(Clone, Copy, Debug)]
struct ValidSplitParams {
    shares: u8,
    threshold: u8,
}

impl Arbitrary for ValidSplitParams {
    fn arbitrary(g: &mut Gen) -> Self {
        // Keep it small: every case writes real files
        let shares = (u8::arbitrary(g) % 8) + 1; // 1..=8
        let threshold = (u8::arbitrary(g) % shares) + 1; // 1..=shares
        ValidSplitParams { shares, threshold }
    }
}

/// A split plus the shares handed back to bind: at least `threshold` of
/// them, shuffled
#[derive(Clone, Debug)]
struct SplitCase {
    params: ValidSplitParams,
    picked: Vec<usize>,
}

impl Arbitrary for SplitCase {
    fn arbitrary(g: &mut Gen) -> Self {
        let params = ValidSplitParams::arbitrary(g);
        let extra = u8::arbitrary(g) % (params.shares - params.threshold + 1);

        let mut picked: Vec<usize> = (0..usize::from(params.shares)).collect();
        for i in (1..picked.len()).rev() {
            let j = usize::arbitrary(g) % (i + 1);
            picked.swap(i, j);
        }
        picked.truncate(usize::from(params.threshold + extra));
        SplitCase { params, picked }
    }
}

/// Streaming chunk sizes small enough to split files into many chunks
#[derive(Clone, Copy, Debug)]
struct SmallChunk(usize);

impl Arbitrary for SmallChunk {
    fn arbitrary(g: &mut Gen) -> Self {
        SmallChunk((usize::arbitrary(g) % 64) + 1)
    }
}

/// Any threshold-sized subset, in any order, with any chunk size, restores the file
#[quickcheck]
fn prop_split_bind_round_trip(content: Vec<u8>, case: SplitCase, chunk: SmallChunk) -> TestResult {
    let SplitCase { params, picked } = case;
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("payload.bin");
    fs::write(&source, &content).unwrap();

    let config = SplitConfig::from_counts(params.shares, params.threshold).unwrap();
    let options = StreamOptions::new(chunk.0).unwrap();
    let paths = split_with(&source, &dir.path().join("shares"), config, options).unwrap();
    if paths.len() != usize::from(params.shares) {
        return TestResult::failed();
    }

    let selected: Vec<_> = picked.iter().map(|&i| paths[i].clone()).collect();

    let out = dir.path().join("restored.bin");
    if bind_with(&selected, &out, false, options).is_err() {
        return TestResult::failed();
    }
    TestResult::from_bool(fs::read(&out).unwrap() == content)
}

/// Fewer than threshold shares are refused before anything is written
#[quickcheck]
fn prop_insufficient_shares_rejected(content: Vec<u8>, params: ValidSplitParams) -> TestResult {
    if params.threshold < 2 {
        return TestResult::discard();
    }

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("payload.bin");
    fs::write(&source, &content).unwrap();

    let config = SplitConfig::from_counts(params.shares, params.threshold).unwrap();
    let paths = split_with(&source, dir.path(), config, StreamOptions::default()).unwrap();

    let out = dir.path().join("restored.bin");
    let short = &paths[..usize::from(params.threshold) - 1];
    let rejected = matches!(
        bind_with(short, &out, false, StreamOptions::default()),
        Err(HorcruxError::InsufficientShares { .. })
    );
    TestResult::from_bool(rejected && !out.exists())
}

/// In-memory dealing agrees with interpolation over every threshold-sized prefix
#[quickcheck]
fn prop_dealer_interpolates(secret: Vec<u8>, params: ValidSplitParams) -> bool {
    let config = SplitConfig::from_counts(params.shares, params.threshold).unwrap();
    let dealer = Dealer::new(config);
    let mut outputs = vec![Vec::new(); dealer.share_count()];
    dealer.deal(&secret, &mut rand::rngs::OsRng, &mut outputs).unwrap();

    let need = usize::from(params.threshold);
    (0..=usize::from(params.shares) - need).all(|start| {
        let xs: Vec<u8> = (start..start + need)
            .map(|j| u8::try_from(j + 1).unwrap())
            .collect();
        let weights = LagrangeWeights::new(&xs, 0).unwrap();
        (0..secret.len()).all(|i| {
            let ys = (start..start + need).map(|j| outputs[j][i]);
            weights.interpolate(ys) == secret[i]
        })
    })
}
