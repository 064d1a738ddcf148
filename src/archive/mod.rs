// SPDX-License-Identifier: GPL-3.0-only
pub mod zip;

pub use self::zip::ZipExtractor;
