//! Item-to-group labels read from two-column tables, e.g. cell -> clone.

use crate::common_io::{detect_delimiter, read_lines_of_words_delim};
use fnv::FnvHashMap as HashMap;
use log::{info, warn};
use rayon::prelude::*;

/// Group label of every item, with labels stored once and referenced by
/// position
#[derive(Clone, Debug)]
pub struct Membership {
    item_pos: HashMap<Box<str>, usize>,
    items: Vec<Box<str>>,
    group_of_item: Vec<usize>,
    groups: Vec<Box<str>>,
}

/// How many query items were found
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

impl Membership {
    /// Build from `(item, group)` pairs. A repeated item keeps its last
    /// group; items stay in the order they first appear.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Box<str>, Box<str>)>) -> Self {
        let mut item_pos = HashMap::default();
        let mut items = vec![];
        let mut group_of_item = vec![];
        let mut group_pos: HashMap<Box<str>, usize> = HashMap::default();
        let mut groups = vec![];

        for (item, group) in pairs {
            let g = *group_pos.entry(group.clone()).or_insert_with(|| {
                groups.push(group);
                groups.len() - 1
            });

            match item_pos.get(&item) {
                Some(&i) => group_of_item[i] = g,
                None => {
                    item_pos.insert(item.clone(), items.len());
                    items.push(item);
                    group_of_item.push(g);
                }
            }
        }

        Self {
            item_pos,
            items,
            group_of_item,
            groups,
        }
    }

    /// Read a delimited table (`.csv`, `.tsv`, optionally `.gz`)
    ///
    /// * `item_col` - column of the item names
    /// * `group_col` - column of the group labels
    /// * `has_header` - the first line holds column names
    pub fn from_file(
        file: &str,
        item_col: usize,
        group_col: usize,
        has_header: bool,
    ) -> anyhow::Result<Self> {
        let hdr_line = if has_header { 0 } else { -1 };
        let lines = read_lines_of_words_delim(file, detect_delimiter(file), hdr_line)?.lines;

        let need = item_col.max(group_col) + 1;
        let mut skipped = 0;
        let pairs: Vec<(Box<str>, Box<str>)> = lines
            .into_iter()
            .filter_map(|words| {
                if words.len() < need {
                    skipped += 1;
                    None
                } else {
                    Some((words[item_col].clone(), words[group_col].clone()))
                }
            })
            .collect();

        if skipped > 0 {
            warn!("{}: skipped {} lines with < {} fields", file, skipped, need);
        }
        if pairs.is_empty() {
            anyhow::bail!("no item-group pairs in {}", file);
        }

        let ret = Self::from_pairs(pairs);
        info!(
            "{}: {} items in {} groups",
            file,
            ret.len(),
            ret.num_groups()
        );
        Ok(ret)
    }

    /// Group label of an item
    pub fn get(&self, item: &str) -> Option<&str> {
        self.item_pos
            .get(item)
            .map(|&i| self.groups[self.group_of_item[i]].as_ref())
    }

    /// Count how many of the queries have a group
    pub fn count_matches(&self, queries: &[Box<str>]) -> MatchStats {
        let matched = queries
            .par_iter()
            .filter(|&q| self.item_pos.contains_key(q))
            .count();

        MatchStats {
            matched,
            unmatched: queries.len() - matched,
        }
    }

    /// Distinct group labels, sorted
    pub fn unique_groups(&self) -> Vec<Box<str>> {
        let mut ret = self.groups.clone();
        ret.sort();
        ret
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(item, group)` in the order items first appeared
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items
            .iter()
            .zip(self.group_of_item.iter())
            .map(|(x, &g)| (x.as_ref(), self.groups[g].as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn clone_table() -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "cell_id,clone_id")?;
        writeln!(file, "AAACCT,B")?;
        writeln!(file, "# comment")?;
        writeln!(file, "BBBCCT,A")?;
        writeln!(file, "CCCCCT,B")?;
        writeln!(file, "short")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn read_clone_table() -> anyhow::Result<()> {
        let file = clone_table()?;
        let clones = Membership::from_file(file.path().to_str().unwrap(), 0, 1, true)?;

        assert_eq!(clones.len(), 3);
        assert_eq!(clones.num_groups(), 2);
        assert_eq!(clones.get("AAACCT"), Some("B"));
        assert_eq!(clones.get("BBBCCT"), Some("A"));
        assert_eq!(clones.get("cell_id"), None);
        assert_eq!(clones.unique_groups(), vec![Box::from("A"), Box::from("B")]);

        let cells: Vec<&str> = clones.iter().map(|(x, _)| x).collect();
        assert_eq!(cells, vec!["AAACCT", "BBBCCT", "CCCCCT"]);
        Ok(())
    }

    #[test]
    fn count_query_matches() {
        let clones = Membership::from_pairs(vec![
            ("c1".into(), "A".into()),
            ("c2".into(), "A".into()),
            ("c1".into(), "B".into()),
        ]);
        assert_eq!(clones.len(), 2);
        assert_eq!(clones.get("c1"), Some("B"));

        let queries: Vec<Box<str>> = vec!["c1".into(), "c3".into(), "c2".into()];
        let stats = clones.count_matches(&queries);
        assert_eq!(
            stats,
            MatchStats {
                matched: 2,
                unmatched: 1
            }
        );
        assert_eq!(stats.total(), 3);
    }
}
