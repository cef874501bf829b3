//! Splitting a file into horcruxes
//!
//! Every source byte becomes the constant term of its own random polynomial
//! of degree `threshold - 1`; share `i` stores that polynomial evaluated at
//! `x = i`. Any `threshold` points pin the polynomial down, fewer leave the
//! constant term uniformly distributed.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::codec::{self, Header};
use crate::domain::{Checksum, ChecksumHasher, ShareIndex, SplitConfig, SplitId};
use crate::error::{HorcruxError, IoStep, Result};
use crate::gf256::{self, Gf256};
use crate::stream::{ChunkReader, CreatedDirs, StagedFile, StreamOptions, parent_dir};

/// File extension of every share
pub const SHARE_EXTENSION: &str = "horcrux";

/// Evaluates fresh random polynomials at the share coordinates
#[derive(Debug, Clone)]
pub struct Dealer {
    xs: Vec<Gf256>,
    degree: usize,
}

impl Dealer {
    #[must_use]
    pub fn new(config: SplitConfig) -> Self {
        Self {
            xs: config
                .share_count()
                .indices()
                .map(|index| Gf256(*index))
                .collect(),
            degree: usize::from(*config.threshold()) - 1,
        }
    }

    /// Number of outputs `deal` fills
    #[must_use]
    pub fn share_count(&self) -> usize {
        self.xs.len()
    }

    /// Shares one chunk of secret bytes
    ///
    /// `outputs[j]` is replaced by the chunk's bytes for share `j + 1`. The
    /// `degree` coefficients of every byte's polynomial are drawn from `rng`
    /// for this call only and wiped afterwards.
    ///
    /// # Errors
    /// Returns the RNG's error if it could not produce bytes
    pub fn deal<R: RngCore + CryptoRng>(
        &self,
        secret: &[u8],
        rng: &mut R,
        outputs: &mut [Vec<u8>],
    ) -> std::result::Result<(), rand::Error> {
        debug_assert_eq!(outputs.len(), self.xs.len());

        let degree = self.degree;
        let mut coefficients = Zeroizing::new(vec![0u8; secret.len() * degree]);
        rng.try_fill_bytes(&mut coefficients)?;

        for (output, &x) in outputs.iter_mut().zip(&self.xs) {
            output.clear();
            output.extend(secret.iter().enumerate().map(|(i, &s)| {
                gf256::evaluate(s, &coefficients[i * degree..(i + 1) * degree], x)
            }));
        }
        Ok(())
    }
}

/// Splits `source` into shares written to `destination_dir`
///
/// See [`split_with_rng`].
///
/// # Errors
/// See [`split_with_rng`]
pub fn split(source: &Path, destination_dir: &Path, config: SplitConfig) -> Result<Vec<PathBuf>> {
    split_with(source, destination_dir, config, StreamOptions::default())
}

/// [`split`] with explicit streaming options
///
/// # Errors
/// See [`split_with_rng`]
pub fn split_with(
    source: &Path,
    destination_dir: &Path,
    config: SplitConfig,
    options: StreamOptions,
) -> Result<Vec<PathBuf>> {
    split_with_rng(source, destination_dir, config, options, &mut OsRng)
}

/// Splits `source` into `config.share_count()` shares using `rng` for coefficients
///
/// The source is read once, in chunks; its checksum is computed during the
/// same pass. Shares are staged as temporary files in `destination_dir`
/// (created if needed) and only renamed to `<stem>_<i>_of_<n>.horcrux` once
/// all of them are complete. On any failure nothing is left behind.
///
/// # Errors
/// - `Open` / `InvalidInput` if the source is unreadable, not a regular file,
///   or has a name that cannot be recorded
/// - `AlreadyExists` if any target share file exists
/// - `Io` naming the failing step otherwise
pub fn split_with_rng<R: RngCore + CryptoRng>(
    source: &Path,
    destination_dir: &Path,
    config: SplitConfig,
    options: StreamOptions,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(source).map_err(|e| HorcruxError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(HorcruxError::InvalidInput(format!(
            "{} is not a regular file",
            source.display()
        )));
    }

    let original_filename = source
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| {
            HorcruxError::InvalidInput(format!(
                "{} has no UTF-8 file name",
                source.display()
            ))
        })?
        .to_string();
    codec::validate_filename(&original_filename).map_err(HorcruxError::InvalidInput)?;

    let file = File::open(source).map_err(|e| HorcruxError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;

    if *config.threshold() == 1 {
        warn!(
            source = %source.display(),
            "threshold 1: every horcrux is a full copy of the original"
        );
    }

    let targets = share_paths(source, destination_dir, config);
    if let Some((_, existing)) = targets.iter().find(|(_, path)| path.exists()) {
        return Err(HorcruxError::AlreadyExists {
            path: existing.clone(),
        });
    }

    let split_id = SplitId::generate(rng).map_err(entropy_error)?;
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let plan = SplitPlan {
        source,
        template: Header {
            original_filename,
            created_at,
            split_id,
            file_size: metadata.len(),
            total: config.share_count(),
            threshold: config.threshold(),
            index: ShareIndex::from_nonzero(1),
            // Rewritten once the checksum is known; the header length does
            // not depend on it
            checksum: Checksum([0; 32]),
        },
        targets,
        config,
        options,
    };

    let created_dirs = CreatedDirs::create(destination_dir).map_err(HorcruxError::io(
        IoStep::CreateDirectory(destination_dir.to_path_buf()),
    ))?;
    match plan.write(file, rng) {
        Ok(created) => {
            info!(
                source = %source.display(),
                destination = %destination_dir.display(),
                shares = created.len(),
                threshold = *config.threshold(),
                "created horcruxes"
            );
            Ok(created)
        }
        Err(e) => {
            created_dirs.remove();
            Err(e)
        }
    }
}

fn entropy_error(e: rand::Error) -> HorcruxError {
    HorcruxError::Io {
        step: IoStep::Entropy,
        source: io::Error::from(e),
    }
}

/// Everything about one split that is settled before any share is written
struct SplitPlan<'a> {
    source: &'a Path,
    template: Header,
    targets: Vec<(ShareIndex, PathBuf)>,
    config: SplitConfig,
    options: StreamOptions,
}

impl SplitPlan<'_> {
    fn header_for(&self, index: ShareIndex, checksum: Checksum) -> Header {
        Header {
            index,
            checksum,
            ..self.template.clone()
        }
    }

    /// Streams `file` into staged shares and renames them into place
    ///
    /// Staged files are dropped, and so removed, on every error path.
    fn write<R: RngCore + CryptoRng>(&self, file: File, rng: &mut R) -> Result<Vec<PathBuf>> {
        let write_step = |index: ShareIndex, target: &Path| IoStep::WriteShare {
            index: *index,
            path: target.to_path_buf(),
        };

        let mut sinks = Vec::with_capacity(self.targets.len());
        for (index, target) in &self.targets {
            let step = || write_step(*index, target);
            let mut sink = StagedFile::new(target).map_err(HorcruxError::io(step()))?;
            sink.write_all(&self.header_for(*index, self.template.checksum).encode())
                .map_err(HorcruxError::io(step()))?;
            sinks.push(sink);
        }

        debug!(
            source = %self.source.display(),
            file_size = self.template.file_size,
            shares = *self.config.share_count(),
            threshold = *self.config.threshold(),
            chunk_size = self.options.chunk_size(),
            "splitting"
        );

        let dealer = Dealer::new(self.config);
        let mut outputs =
            vec![Vec::with_capacity(self.options.chunk_size()); dealer.share_count()];
        let mut hasher = ChecksumHasher::new();
        let mut reader = ChunkReader::new(file, self.template.file_size, self.options);

        loop {
            let chunk = reader
                .next_chunk()
                .map_err(HorcruxError::io(IoStep::ReadSource(self.source.to_path_buf())))?;
            if chunk.is_empty() {
                break;
            }
            hasher.update(chunk);
            dealer
                .deal(chunk, rng, &mut outputs)
                .map_err(entropy_error)?;
            for ((index, target), (sink, output)) in
                self.targets.iter().zip(sinks.iter_mut().zip(&outputs))
            {
                sink.write_all(output)
                    .map_err(HorcruxError::io(write_step(*index, target)))?;
            }
        }

        let checksum = hasher.finalize();
        for ((index, target), sink) in self.targets.iter().zip(sinks.iter_mut()) {
            sink.rewrite_prefix(&self.header_for(*index, checksum).encode())
                .map_err(HorcruxError::io(write_step(*index, target)))?;
        }
        debug!(%checksum, "checksum recorded");

        persist_all(sinks, &self.targets)
    }
}

/// Renames every staged share into place, undoing earlier renames if one fails
fn persist_all(sinks: Vec<StagedFile>, targets: &[(ShareIndex, PathBuf)]) -> Result<Vec<PathBuf>> {
    let mut created = Vec::with_capacity(sinks.len());
    for (sink, (index, target)) in sinks.into_iter().zip(targets) {
        match sink.commit(false) {
            Ok(path) => created.push(path),
            Err(e) => {
                for path in &created {
                    if let Err(cleanup) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %cleanup, "failed to remove horcrux");
                    }
                }
                if e.kind() == io::ErrorKind::AlreadyExists {
                    return Err(HorcruxError::AlreadyExists {
                        path: target.clone(),
                    });
                }
                return Err(HorcruxError::Io {
                    step: IoStep::WriteShare {
                        index: **index,
                        path: target.clone(),
                    },
                    source: e,
                });
            }
        }
    }
    Ok(created)
}

/// Final path of every share of a split, in index order
#[must_use]
pub fn share_paths(
    source: &Path,
    destination_dir: &Path,
    config: SplitConfig,
) -> Vec<(ShareIndex, PathBuf)> {
    let stem = file_stem(source);
    let total = *config.share_count();
    config
        .share_count()
        .indices()
        .map(|index| {
            let name = format!("{stem}_{index}_of_{total}.{SHARE_EXTENSION}");
            (index, destination_dir.join(name))
        })
        .collect()
}

/// Where a front end should put the shares of `source` unless told otherwise:
/// a `<stem>_horcruxes` directory next to it
#[must_use]
pub fn default_output_dir(source: &Path) -> PathBuf {
    parent_dir(source).join(format!("{}_horcruxes", file_stem(source)))
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "horcrux".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    use crate::gf256::LagrangeWeights;

    /// Hands out a fixed byte sequence as "randomness"
    struct ScriptedRng {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                *byte = self.bytes[self.pos % self.bytes.len()];
                self.pos += 1;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ScriptedRng {}

    /// Hands out `budget` zero bytes, then fails
    struct ExhaustedRng {
        budget: usize,
    }

    impl RngCore for ExhaustedRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            if dest.len() > self.budget {
                return Err(rand::Error::new(io::Error::other("entropy source exhausted")));
            }
            self.budget -= dest.len();
            dest.fill(0);
            Ok(())
        }
    }

    impl CryptoRng for ExhaustedRng {}

    fn config(shares: u8, threshold: u8) -> SplitConfig {
        SplitConfig::from_counts(shares, threshold).unwrap()
    }

    #[test]
    fn test_dealer_threshold_one_copies_secret() {
        let dealer = Dealer::new(config(3, 1));
        let mut outputs = vec![Vec::new(); 3];
        dealer
            .deal(b"plain", &mut StdRng::seed_from_u64(1), &mut outputs)
            .unwrap();
        for output in outputs {
            assert_eq!(output, b"plain");
        }
    }

    #[test]
    fn test_dealt_shares_interpolate_back() {
        let dealer = Dealer::new(config(5, 3));
        let secret: Vec<u8> = (0..=255).collect();
        let mut outputs = vec![Vec::new(); 5];
        dealer
            .deal(&secret, &mut StdRng::seed_from_u64(7), &mut outputs)
            .unwrap();

        // shares 2, 4 and 5
        let weights = LagrangeWeights::new(&[2, 4, 5], 0).unwrap();
        let recovered: Vec<u8> = (0..secret.len())
            .map(|i| weights.interpolate([outputs[1][i], outputs[3][i], outputs[4][i]]))
            .collect();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn test_single_share_is_uniform_over_coefficients() {
        // Threshold 2: share x sees s + a*x. Enumerating every coefficient a
        // must hit every byte value exactly once, whatever s is.
        let dealer = Dealer::new(config(2, 2));
        let coefficients: Vec<u8> = (0..=255).collect();
        for secret_byte in [0x00u8, 0x5a, 0xff] {
            let secret = vec![secret_byte; 256];
            let mut rng = ScriptedRng {
                bytes: coefficients.clone(),
                pos: 0,
            };
            let mut outputs = vec![Vec::new(); 2];
            dealer.deal(&secret, &mut rng, &mut outputs).unwrap();

            for output in &outputs {
                let mut seen = output.clone();
                seen.sort_unstable();
                assert_eq!(seen, coefficients, "secret {secret_byte:#04x}");
            }
        }
    }

    #[test]
    fn test_two_shares_of_threshold_three_are_jointly_uniform() {
        let dealer = Dealer::new(config(3, 3));
        // every (a1, a2) pair once
        let coefficients: Vec<u8> = (0..=u16::MAX).flat_map(u16::to_le_bytes).collect();
        for secret_byte in [0x00u8, 0xc3] {
            let secret = vec![secret_byte; 1 << 16];
            let mut rng = ScriptedRng {
                bytes: coefficients.clone(),
                pos: 0,
            };
            let mut outputs = vec![Vec::new(); 3];
            dealer.deal(&secret, &mut rng, &mut outputs).unwrap();

            let mut seen = vec![false; 1 << 16];
            for (&y1, &y2) in outputs[0].iter().zip(&outputs[1]) {
                let slot = usize::from(y1) << 8 | usize::from(y2);
                assert!(!seen[slot], "pair ({y1}, {y2}) repeated");
                seen[slot] = true;
            }
        }
    }

    #[test]
    fn test_share_paths_naming() {
        let paths = share_paths(
            Path::new("/home/me/report.pdf"),
            Path::new("/backup"),
            config(3, 2),
        );
        let names: Vec<_> = paths
            .iter()
            .map(|(index, path)| (**index, path.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            names,
            vec![
                (1, "/backup/report_1_of_3.horcrux".to_string()),
                (2, "/backup/report_2_of_3.horcrux".to_string()),
                (3, "/backup/report_3_of_3.horcrux".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/Users/me/tick.png")),
            PathBuf::from("/Users/me/tick_horcruxes")
        );
    }

    #[test]
    fn test_split_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = split(dir.path(), &dir.path().join("out"), config(2, 2)).unwrap_err();
        assert!(matches!(err, HorcruxError::InvalidInput(_)));
    }

    #[test]
    fn test_split_missing_source_is_open_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = split(&missing, dir.path(), config(2, 2)).unwrap_err();
        assert!(matches!(err, HorcruxError::Open { path, .. } if path == missing));
    }

    #[test]
    fn test_split_writes_headers_with_checksum() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        fs::write(&source, b"remember the milk").unwrap();

        let out = dir.path().join("shares");
        let options = StreamOptions::new(5).unwrap();
        let paths = split_with(&source, &out, config(4, 2), options).unwrap();
        assert_eq!(paths.len(), 4);

        for (position, path) in paths.iter().enumerate() {
            let bytes = fs::read(path).unwrap();
            let (header, consumed) = Header::decode(&bytes).unwrap();
            assert_eq!(header.original_filename, "notes.txt");
            assert_eq!(header.file_size, 17);
            assert_eq!(*header.index as usize, position + 1);
            assert_eq!(header.checksum, Checksum::of(b"remember the milk"));
            assert_eq!(bytes.len() - consumed, 17);
        }
    }

    #[test]
    fn test_split_refuses_to_clobber_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, [1, 2, 3]).unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("a_2_of_3.horcrux"), b"someone else's").unwrap();

        let err = split(&source, &out, config(3, 2)).unwrap_err();
        assert!(err.is_already_exists());

        let leftovers: Vec<_> = fs::read_dir(&out).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
        assert_eq!(
            fs::read(out.join("a_2_of_3.horcrux")).unwrap(),
            b"someone else's"
        );
    }

    #[test]
    fn test_persist_collision_rolls_back_earlier_shares() {
        let dir = TempDir::new().unwrap();
        let targets = share_paths(Path::new("a.bin"), dir.path(), config(3, 2));
        let sinks: Vec<StagedFile> = targets
            .iter()
            .map(|(index, target)| {
                let mut sink = StagedFile::new(target).unwrap();
                sink.write_all(&[**index]).unwrap();
                sink
            })
            .collect();

        // someone else takes the last name after the up-front check
        let (_, last) = &targets[2];
        fs::write(last, b"someone else's").unwrap();

        let err = persist_all(sinks, &targets).unwrap_err();
        assert!(matches!(&err, HorcruxError::AlreadyExists { path } if path == last));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(leftovers, vec![last.clone()]);
        assert_eq!(fs::read(last).unwrap(), b"someone else's");
    }

    #[test]
    fn test_failed_split_removes_created_directories() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, [1, 2, 3]).unwrap();
        let out = dir.path().join("new").join("shares");

        // enough for the split id, not for the coefficients
        let mut rng = ExhaustedRng {
            budget: crate::domain::SPLIT_ID_LEN,
        };
        let options = StreamOptions::default();
        let err = split_with_rng(&source, &out, config(3, 2), options, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            HorcruxError::Io {
                step: IoStep::Entropy,
                ..
            }
        ));
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn test_failed_split_keeps_existing_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, [1, 2, 3]).unwrap();

        let mut rng = ExhaustedRng {
            budget: crate::domain::SPLIT_ID_LEN,
        };
        let options = StreamOptions::default();
        assert!(split_with_rng(&source, dir.path(), config(2, 2), options, &mut rng).is_err());

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, vec![source]);
    }
}
