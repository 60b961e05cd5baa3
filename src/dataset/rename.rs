use serde_json::Map;

use super::models::GeoTable;

/// Column normalization applied to camp datasets.
pub const CAMP_COLUMNS: ColumnMapping = ColumnMapping::new(&[
    ("name", "camp_name"),
    ("Country", "country_name"),
    ("Latitude", "lat"),
    ("Longitude", "lon"),
]);

/// Declarative `old name -> new name` column mapping.
///
/// Matching is exact and case-sensitive. Columns missing from a row are
/// skipped and columns outside the mapping pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pairs: &'static [(&'static str, &'static str)],
}

impl ColumnMapping {
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &'static [(&'static str, &'static str)] {
        self.pairs
    }

    /// New name for `column`, if the mapping renames it.
    pub fn target_of(&self, column: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(from, _)| *from == column)
            .map(|(_, to)| *to)
    }

    /// Renames the columns of every row in place.
    ///
    /// All renames of a row happen at once, so a renamed column is never
    /// renamed a second time. A renamed value replaces any column already
    /// holding the target name.
    pub fn apply(&self, table: &mut GeoTable) {
        for row in table.rows_mut() {
            let properties = std::mem::take(&mut row.properties);
            let mut renamed = Vec::new();
            let mut kept = Map::new();

            for (column, value) in properties {
                match self.target_of(&column) {
                    Some(target) => renamed.push((target.to_owned(), value)),
                    None => {
                        kept.insert(column, value);
                    }
                }
            }
            kept.extend(renamed);
            row.properties = kept;
        }
    }
}
