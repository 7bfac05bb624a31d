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

//! Sequencing lanes and the file roles found in each lane.

/// One of the eight lanes of a flow cell, tagged `L001`..`L008` in filenames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lane(u8);

impl Lane {
    pub const COUNT: u8 = 8;

    /// Lane `number`, counting from 1.
    pub fn new(
        number: u8,
    ) -> Option<Lane> {
        (1..=Self::COUNT).contains(&number).then_some(Lane(number))
    }

    /// All lanes in order.
    pub fn all() -> impl Iterator<Item = Lane> {
        (1..=Self::COUNT).map(Lane)
    }

    pub fn number(
        &self,
    ) -> u8 {
        self.0
    }

    /// Tag used in filenames, eg. `L004`.
    pub fn tag(
        &self,
    ) -> String {
        format!("L{:03}", self.0)
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A file slot within a lane.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    R1,
    R2,
    R3,
    I1,
    I2,
    /// Cell hashing file of the 3-file-hash bundle.
    Hash,
}

impl Role {
    /// Substring identifying the role in a filename.
    pub fn marker(
        &self,
    ) -> &'static str {
        match self {
            Role::R1 => "_R1",
            Role::R2 => "_R2",
            Role::R3 => "_R3",
            Role::I1 => "_I1",
            Role::I2 => "_I2",
            Role::Hash => "_hash",
        }
    }

    /// Whether `filename` carries this role's marker.
    ///
    /// Read and index markers are case sensitive, the hash marker is not.
    pub fn matches(
        &self,
        filename: &str,
    ) -> bool {
        match self {
            Role::Hash => filename.to_ascii_lowercase().contains(self.marker()),
            _ => filename.contains(self.marker()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.marker().trim_start_matches('_'))
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn lane_tags() {
        use super::Lane;

        let got: Vec<String> = Lane::all().map(|x| x.tag()).collect();

        assert_eq!(got, vec!["L001", "L002", "L003", "L004", "L005", "L006", "L007", "L008"]);
        assert_eq!(Lane::new(0), None);
        assert_eq!(Lane::new(9), None);
        assert_eq!(Lane::new(8).map(|x| x.number()), Some(8));
    }

    #[test]
    fn role_markers() {
        use super::Role;

        assert!(Role::R1.matches("LIB1_S1_L001_R1_001.fastq.gz"));
        assert!(!Role::R2.matches("LIB1_S1_L001_R1_001.fastq.gz"));
        assert!(Role::Hash.matches("LIB1_S1_L001_HASH_001.fastq.gz"));
        assert_eq!(Role::I2.to_string(), "I2");
    }
}
