// seqqa: Quality assurance of delivered sequencing files against a file manifest.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

/// Check that two sibling filenames differ in at most one character.
///
/// Paired files such as `_R1`/`_R2` or `_I1`/`_I2` are identical apart from
/// the one marker character. The names are compared position by position up
/// to the length of the shorter one.
///
/// ## Usage
///
/// ```rust
/// use seqqa::name_match::matches;
///
/// assert!(matches("X_R1_001.fastq.gz", "X_R2_001.fastq.gz"));
/// assert!(!matches("X_S1_L001_I1_001.fastq.gz", "X_S542_L001_I2_001.fastq.gz"));
/// ```
///
pub fn matches(
    name1: &str,
    name2: &str,
) -> bool {
    let n_diff = name1.chars().zip(name2.chars()).filter(|(a, b)| a != b).count();
    n_diff <= 1
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn matches_read_pair() {
        use super::matches;

        assert!(matches("LIB1_S1_L001_R1_001.fastq.gz", "LIB1_S1_L001_R2_001.fastq.gz"));
        assert!(matches("LIB1_S1_L001_I1_001.fq.gz", "LIB1_S1_L001_I2_001.fq.gz"));
    }

    #[test]
    fn matches_is_reflexive_and_symmetric() {
        use super::matches;

        let names = [
            "LIB1_S1_L001_R1_001.fastq.gz",
            "LIB1_S1_L001_R2_001.fastq.gz",
            "LIB1_S2_L001_R2_001.fastq.gz",
            "LIB1_S1_L001_R1_001.fq.gz",
            "",
        ];
        for a in names.iter() {
            assert!(matches(a, a));
            for b in names.iter() {
                assert_eq!(matches(a, b), matches(b, a));
            }
        }
    }

    #[test]
    fn two_differences_do_not_match() {
        use super::matches;

        assert!(!matches("LIB1_S1_L001_R1_001.fastq.gz", "LIB1_S2_L001_R2_001.fastq.gz"));
        assert!(!matches("X_S1_L001_I1_001.fastq.gz", "X_S542_L001_I2_001.fastq.gz"));
    }

    #[test]
    fn trailing_characters_are_not_compared() {
        use super::matches;

        assert!(matches("A_R1.fastq", "A_R2.fastq.gz"));
    }
}
