//! Symbol indexes and remote documents.

use engine::wire::{FullResponse, PatchResponse};
use index::{SymbolEntry, SymbolIndex};

/// Block length used for fixture patches; small so tiny snapshots still
/// produce copy tokens.
pub const PATCH_BLOCK_LEN: u32 = 16;

/// A small catalog at `version`.
#[must_use]
pub fn sample_index(version: &str) -> SymbolIndex {
    SymbolIndex::new(
        version,
        vec![
            SymbolEntry::new("JsonConvert", "Newtonsoft.Json", "Newtonsoft.Json", 220)
                .with_package_version("13.0.3")
                .with_assembly("Newtonsoft.Json"),
            SymbolEntry::new("JsonSerializer", "System.Text.Json", "System.Text.Json", 200)
                .with_assembly("System.Text.Json"),
            SymbolEntry::new("ILogger", "Microsoft.Extensions.Logging", "Microsoft.Extensions.Logging.Abstractions", 210)
                .with_assembly("Microsoft.Extensions.Logging.Abstractions"),
            SymbolEntry::new("ILogger", "Serilog", "Serilog", 150).with_assembly("Serilog"),
            SymbolEntry::new("List", "System.Collections.Generic", "System.Runtime", 255)
                .with_arity(1)
                .in_reference_assembly()
                .with_assembly("System.Runtime"),
        ],
    )
}

/// [`sample_index`] at `version` plus one extra entry, so it differs in
/// content as well as version.
#[must_use]
pub fn evolved_index(version: &str) -> SymbolIndex {
    let mut entries = sample_index(version).entries().to_vec();
    entries.push(
        SymbolEntry::new("Retry", "Polly", "Polly", 180)
            .with_package_version("8.4.0")
            .with_assembly("Polly"),
    );
    SymbolIndex::new(version, entries)
}

/// Encoded snapshot bytes of `index`.
#[must_use]
pub fn snapshot_bytes(symbols: &SymbolIndex) -> Vec<u8> {
    index::encode(symbols)
}

/// Full snapshot document carrying `index`, with checksum.
#[must_use]
pub fn full_document(index: &SymbolIndex) -> Vec<u8> {
    let response = FullResponse::for_snapshot(&snapshot_bytes(index)).expect("deflate snapshot");
    serde_json::to_vec(&response).expect("serialise full document")
}

/// Full snapshot document carrying `index` with a wrong checksum.
#[must_use]
pub fn corrupt_full_document(index: &SymbolIndex) -> Vec<u8> {
    let mut response = FullResponse::for_snapshot(&snapshot_bytes(index)).expect("deflate snapshot");
    response.checksum = Some(checksums_of(b"something else"));
    serde_json::to_vec(&response).expect("serialise full document")
}

/// Patch document turning `from` into `to`, with checksum.
#[must_use]
pub fn patch_document(from: &SymbolIndex, to: &SymbolIndex) -> Vec<u8> {
    let patch = delta::generate_patch(&snapshot_bytes(from), &snapshot_bytes(to), PATCH_BLOCK_LEN);
    serde_json::to_vec(&PatchResponse::delta(&patch)).expect("serialise patch document")
}

/// Patch document whose checksum does not match its content.
#[must_use]
pub fn corrupt_patch_document(from: &SymbolIndex, to: &SymbolIndex) -> Vec<u8> {
    let patch = delta::generate_patch(&snapshot_bytes(from), &snapshot_bytes(to), PATCH_BLOCK_LEN);
    let mut response = PatchResponse::delta(&patch);
    response.checksum = Some(checksums_of(b"something else"));
    serde_json::to_vec(&response).expect("serialise patch document")
}

/// `{"upToDate":true}`
#[must_use]
pub fn up_to_date_document() -> Vec<u8> {
    serde_json::to_vec(&PatchResponse::up_to_date()).expect("serialise patch document")
}

/// `{"tooOld":true}`
#[must_use]
pub fn too_old_document() -> Vec<u8> {
    serde_json::to_vec(&PatchResponse::too_old()).expect("serialise patch document")
}

fn checksums_of(bytes: &[u8]) -> String {
    PatchResponse::delta(bytes).checksum.expect("delta carries checksum")
}
