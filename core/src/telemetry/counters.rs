//! telemetry/counters.rs
//! Counters collected while encoding/decoding one pack.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackCounters {
    pub entries_encrypted: u64,
    pub entries_decrypted: u64,
    pub entries_verbatim: u64,
    pub directories: u64,
    pub subpacks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Batches that had to run on the caller thread.
    pub sequential_fallbacks: u64,
}

impl PackCounters {
    pub fn add_encrypted(&mut self, len: usize) {
        self.entries_encrypted += 1;
        self.bytes_in += len as u64;
    }

    pub fn add_decrypted(&mut self, len: usize) {
        self.entries_decrypted += 1;
        self.bytes_in += len as u64;
    }

    pub fn add_verbatim(&mut self, len: usize) {
        self.entries_verbatim += 1;
        self.bytes_in += len as u64;
    }

    pub fn add_directory(&mut self) {
        self.directories += 1;
    }

    pub fn add_subpack(&mut self) {
        self.subpacks += 1;
    }

    pub fn set_output_len(&mut self, len: usize) {
        self.bytes_out = len as u64;
    }

    pub fn total_entries(&self) -> u64 {
        self.entries_encrypted + self.entries_decrypted + self.entries_verbatim
    }
}

impl AddAssign for PackCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.entries_encrypted    += rhs.entries_encrypted;
        self.entries_decrypted    += rhs.entries_decrypted;
        self.entries_verbatim     += rhs.entries_verbatim;
        self.directories          += rhs.directories;
        self.subpacks             += rhs.subpacks;
        self.bytes_in             += rhs.bytes_in;
        self.bytes_out            += rhs.bytes_out;
        self.sequential_fallbacks += rhs.sequential_fallbacks;
    }
}
