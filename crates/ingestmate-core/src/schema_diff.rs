//! Diff consecutive schema versions into `SchemaChange` records.

use crate::types::{SchemaChange, SchemaChangeKind, SchemaColumn, SchemaVersion, Severity};

/// Compare two versions of one pipeline's schema, matching columns by name.
/// Emits adds, then removes, then modifies, each in column order.
pub fn diff_versions(from: &SchemaVersion, to: &SchemaVersion) -> Vec<SchemaChange> {
    let mut kinds = Vec::new();

    for col in &to.columns {
        if find(&from.columns, &col.name).is_none() {
            kinds.push(SchemaChangeKind::Add {
                column: col.clone(),
            });
        }
    }
    for col in &from.columns {
        if find(&to.columns, &col.name).is_none() {
            kinds.push(SchemaChangeKind::Remove {
                column: col.clone(),
            });
        }
    }
    for old in &from.columns {
        if let Some(new) = find(&to.columns, &old.name) {
            if new.data_type != old.data_type || new.nullable != old.nullable {
                kinds.push(SchemaChangeKind::Modify {
                    column: new.clone(),
                    previous_column: old.clone(),
                });
            }
        }
    }

    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| SchemaChange {
            id: format!("{}-{}-{i}", to.id, kind.label()),
            pipeline: to.pipeline.clone(),
            from_version: from.version,
            to_version: to.version,
            timestamp: to.timestamp,
            impact: impact_of(&kind),
            description: describe(&kind),
            kind,
        })
        .collect()
}

/// Diff every consecutive pair in `versions` (sorted by version number first).
pub fn diff_history(versions: &[SchemaVersion]) -> Vec<SchemaChange> {
    let mut sorted: Vec<&SchemaVersion> = versions.iter().collect();
    sorted.sort_by_key(|v| v.version);
    sorted
        .windows(2)
        .flat_map(|pair| diff_versions(pair[0], pair[1]))
        .collect()
}

fn find<'a>(columns: &'a [SchemaColumn], name: &str) -> Option<&'a SchemaColumn> {
    columns.iter().find(|c| c.name == name)
}

fn impact_of(kind: &SchemaChangeKind) -> Severity {
    match kind {
        SchemaChangeKind::Add { column } if column.nullable => Severity::Low,
        SchemaChangeKind::Add { .. } => Severity::Medium,
        SchemaChangeKind::Remove { .. } => Severity::High,
        SchemaChangeKind::Modify {
            column,
            previous_column,
        } => {
            let tightened = previous_column.nullable && !column.nullable;
            if column.data_type != previous_column.data_type {
                if tightened {
                    Severity::High
                } else {
                    Severity::Medium
                }
            } else if tightened {
                Severity::Medium
            } else {
                Severity::Low
            }
        }
        SchemaChangeKind::Rename { .. } => Severity::Medium,
    }
}

fn describe(kind: &SchemaChangeKind) -> String {
    let shape = |c: &SchemaColumn| {
        if c.nullable {
            format!("{} (nullable)", c.data_type)
        } else {
            c.data_type.clone()
        }
    };
    match kind {
        SchemaChangeKind::Add { column } => {
            format!("Added new column {} of type {}", column.name, column.data_type)
        }
        SchemaChangeKind::Remove { column } => {
            format!("Removed column {} of type {}", column.name, column.data_type)
        }
        SchemaChangeKind::Modify {
            column,
            previous_column,
        } => format!(
            "Modified column {}: {} \u{2192} {}",
            column.name,
            shape(previous_column),
            shape(column)
        ),
        SchemaChangeKind::Rename {
            column,
            previous_name,
        } => match previous_name {
            Some(prev) => format!("Renamed column {prev} to {}", column.name),
            None => format!("Renamed column {}", column.name),
        },
    }
}
