use dsgen_core::{OutputConfig, Table, TableRole};

/// Location of the output for `table`: `<directory><separator><name><suffix>`.
pub fn resolve_location(table: Table, config: &OutputConfig) -> String {
    format!(
        "{}{}{}{}",
        config.target_directory,
        config.separator,
        table.name(),
        config.suffix
    )
}

/// Tables that need a destination when generating `table`, parent first.
///
/// A parent brings its child only for a family run. A child table requested
/// on its own needs only its own destination.
pub fn destination_tables(
    table: Table,
    family_run: bool,
) -> impl Iterator<Item = (TableRole, Table)> {
    let requested = table.role();
    table
        .family()
        .members()
        .filter(move |(role, member)| match requested {
            TableRole::Parent => family_run || *role == TableRole::Parent,
            TableRole::Child => *member == table,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn config(suffix: &str) -> OutputConfig {
        OutputConfig {
            target_directory: "/tmp/out".to_string(),
            separator: "/".to_string(),
            suffix: suffix.to_string(),
            family_run: true,
        }
    }

    #[test]
    fn joins_directory_name_and_suffix() {
        assert_eq!(
            resolve_location(Table::Store, &config(".dat")),
            "/tmp/out/store.dat"
        );
        assert_eq!(
            resolve_location(Table::StoreSales, &config("_2_4.dat")),
            "/tmp/out/store_sales_2_4.dat"
        );
    }

    #[test]
    fn resolution_is_stable_and_collision_free() {
        let config = config(".dat");
        let locations: HashSet<String> = Table::ALL
            .into_iter()
            .map(|table| resolve_location(table, &config))
            .collect();
        assert_eq!(locations.len(), Table::ALL.len());
        for table in Table::ALL {
            assert_eq!(
                resolve_location(table, &config),
                resolve_location(table, &config.clone())
            );
        }
    }

    #[test]
    fn child_destination_only_in_family_runs() {
        let family: Vec<_> = destination_tables(Table::WebSales, true).collect();
        assert_eq!(
            family,
            vec![
                (TableRole::Parent, Table::WebSales),
                (TableRole::Child, Table::WebReturns)
            ]
        );
        assert_eq!(destination_tables(Table::WebSales, false).count(), 1);
        assert_eq!(destination_tables(Table::Item, true).count(), 1);
    }

    #[test]
    fn child_request_needs_only_the_child_destination() {
        let members: Vec<_> = destination_tables(Table::WebReturns, true).collect();
        assert_eq!(members, vec![(TableRole::Child, Table::WebReturns)]);
    }
}
