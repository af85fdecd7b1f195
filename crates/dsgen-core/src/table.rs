use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A benchmark table from the catalog.
///
/// Tables form a forest of depth two: a table has at most one child
/// ([`Table::child`]) and a child never has a child of its own, because
/// [`ChildTable`] exposes no child accessor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    CallCenter,
    CatalogPage,
    CatalogReturns,
    CatalogSales,
    Customer,
    CustomerAddress,
    CustomerDemographics,
    DateDim,
    HouseholdDemographics,
    IncomeBand,
    Inventory,
    Item,
    Promotion,
    Reason,
    ShipMode,
    Store,
    StoreReturns,
    StoreSales,
    TimeDim,
    Warehouse,
    WebPage,
    WebReturns,
    WebSales,
    WebSite,
    DbgenVersion,
}

/// A table whose rows only exist alongside a parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildTable {
    CatalogReturns,
    StoreReturns,
    WebReturns,
}

/// Position of a table inside a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Parent,
    Child,
}

/// A parent table together with its optional child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFamily {
    pub parent: Table,
    pub child: Option<ChildTable>,
}

/// How a table's row count grows with the scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scaling {
    Fixed(u64),
    Linear(u64),
}

impl Table {
    /// Every table in catalog order.
    pub const ALL: [Table; 25] = [
        Table::CallCenter,
        Table::CatalogPage,
        Table::CatalogReturns,
        Table::CatalogSales,
        Table::Customer,
        Table::CustomerAddress,
        Table::CustomerDemographics,
        Table::DateDim,
        Table::HouseholdDemographics,
        Table::IncomeBand,
        Table::Inventory,
        Table::Item,
        Table::Promotion,
        Table::Reason,
        Table::ShipMode,
        Table::Store,
        Table::StoreReturns,
        Table::StoreSales,
        Table::TimeDim,
        Table::Warehouse,
        Table::WebPage,
        Table::WebReturns,
        Table::WebSales,
        Table::WebSite,
        Table::DbgenVersion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::CallCenter => "call_center",
            Table::CatalogPage => "catalog_page",
            Table::CatalogReturns => "catalog_returns",
            Table::CatalogSales => "catalog_sales",
            Table::Customer => "customer",
            Table::CustomerAddress => "customer_address",
            Table::CustomerDemographics => "customer_demographics",
            Table::DateDim => "date_dim",
            Table::HouseholdDemographics => "household_demographics",
            Table::IncomeBand => "income_band",
            Table::Inventory => "inventory",
            Table::Item => "item",
            Table::Promotion => "promotion",
            Table::Reason => "reason",
            Table::ShipMode => "ship_mode",
            Table::Store => "store",
            Table::StoreReturns => "store_returns",
            Table::StoreSales => "store_sales",
            Table::TimeDim => "time_dim",
            Table::Warehouse => "warehouse",
            Table::WebPage => "web_page",
            Table::WebReturns => "web_returns",
            Table::WebSales => "web_sales",
            Table::WebSite => "web_site",
            Table::DbgenVersion => "dbgen_version",
        }
    }

    /// The child generated alongside this table, if any.
    pub fn child(self) -> Option<ChildTable> {
        match self {
            Table::CatalogSales => Some(ChildTable::CatalogReturns),
            Table::StoreSales => Some(ChildTable::StoreReturns),
            Table::WebSales => Some(ChildTable::WebReturns),
            _ => None,
        }
    }

    pub fn has_child(self) -> bool {
        self.child().is_some()
    }

    /// This table viewed as a child, when it is one.
    pub fn as_child(self) -> Option<ChildTable> {
        match self {
            Table::CatalogReturns => Some(ChildTable::CatalogReturns),
            Table::StoreReturns => Some(ChildTable::StoreReturns),
            Table::WebReturns => Some(ChildTable::WebReturns),
            _ => None,
        }
    }

    pub fn is_child(self) -> bool {
        self.as_child().is_some()
    }

    /// The family this table belongs to; a child resolves to its parent's.
    pub fn family(self) -> TableFamily {
        match self.as_child() {
            Some(child) => TableFamily {
                parent: child.parent(),
                child: Some(child),
            },
            None => TableFamily {
                parent: self,
                child: self.child(),
            },
        }
    }

    /// Role of this table inside its family.
    pub fn role(self) -> TableRole {
        if self.is_child() {
            TableRole::Child
        } else {
            TableRole::Parent
        }
    }

    /// Tables that are not children of another table, in catalog order.
    pub fn roots() -> impl Iterator<Item = Table> {
        Table::ALL.into_iter().filter(|table| !table.is_child())
    }

    /// Number of rows for this table at the given scale factor.
    ///
    /// Child rows are numbered by their parent, so a child reports the
    /// parent's count.
    pub fn row_count(self, scale: f64) -> u64 {
        if let Some(child) = self.as_child() {
            return child.parent().row_count(scale);
        }
        match self.scaling() {
            Scaling::Fixed(rows) => rows,
            Scaling::Linear(rows) => ((rows as f64) * scale).ceil().max(1.0) as u64,
        }
    }

    fn scaling(self) -> Scaling {
        match self {
            Table::CallCenter => Scaling::Linear(6),
            Table::CatalogPage => Scaling::Linear(11_718),
            Table::CatalogSales => Scaling::Linear(1_441_548),
            Table::Customer => Scaling::Linear(100_000),
            Table::CustomerAddress => Scaling::Linear(50_000),
            Table::CustomerDemographics => Scaling::Fixed(1_920_800),
            Table::DateDim => Scaling::Fixed(73_049),
            Table::HouseholdDemographics => Scaling::Fixed(7_200),
            Table::IncomeBand => Scaling::Fixed(20),
            Table::Inventory => Scaling::Linear(11_745_000),
            Table::Item => Scaling::Linear(18_000),
            Table::Promotion => Scaling::Linear(300),
            Table::Reason => Scaling::Fixed(35),
            Table::ShipMode => Scaling::Fixed(20),
            Table::Store => Scaling::Linear(12),
            Table::StoreSales => Scaling::Linear(2_880_404),
            Table::TimeDim => Scaling::Fixed(86_400),
            Table::Warehouse => Scaling::Linear(5),
            Table::WebPage => Scaling::Linear(60),
            Table::WebSales => Scaling::Linear(719_384),
            Table::WebSite => Scaling::Linear(30),
            Table::DbgenVersion => Scaling::Fixed(1),
            Table::CatalogReturns | Table::StoreReturns | Table::WebReturns => Scaling::Fixed(0),
        }
    }
}

impl ChildTable {
    pub fn table(self) -> Table {
        match self {
            ChildTable::CatalogReturns => Table::CatalogReturns,
            ChildTable::StoreReturns => Table::StoreReturns,
            ChildTable::WebReturns => Table::WebReturns,
        }
    }

    pub fn parent(self) -> Table {
        match self {
            ChildTable::CatalogReturns => Table::CatalogSales,
            ChildTable::StoreReturns => Table::StoreSales,
            ChildTable::WebReturns => Table::WebSales,
        }
    }

    pub fn name(self) -> &'static str {
        self.table().name()
    }
}

impl TableFamily {
    /// Tables of the family with their roles, parent first.
    pub fn members(self) -> impl Iterator<Item = (TableRole, Table)> {
        std::iter::once((TableRole::Parent, self.parent))
            .chain(self.child.map(|child| (TableRole::Child, child.table())))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ChildTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::Parent => f.write_str("parent"),
            TableRole::Child => f.write_str("child"),
        }
    }
}

impl FromStr for Table {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Table::ALL
            .into_iter()
            .find(|table| table.name() == wanted)
            .ok_or_else(|| CoreError::UnknownTable(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_point_back_to_their_parent() {
        for table in Table::ALL {
            if let Some(child) = table.child() {
                assert_eq!(child.parent(), table);
                assert!(child.table().is_child());
                assert!(!child.table().has_child());
            }
        }
    }

    #[test]
    fn child_flag_matches_families() {
        let children: Vec<Table> = Table::ALL.into_iter().filter(|t| t.is_child()).collect();
        assert_eq!(
            children,
            vec![Table::CatalogReturns, Table::StoreReturns, Table::WebReturns]
        );
        assert_eq!(Table::roots().count(), Table::ALL.len() - 3);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("STORE_SALES".parse::<Table>().unwrap(), Table::StoreSales);
        assert_eq!(" store ".parse::<Table>().unwrap(), Table::Store);
        assert!(matches!(
            "stores".parse::<Table>(),
            Err(CoreError::UnknownTable(name)) if name == "stores"
        ));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Table::ALL.len());
    }

    #[test]
    fn family_members_list_parent_first() {
        let members: Vec<_> = Table::StoreSales.family().members().collect();
        assert_eq!(
            members,
            vec![
                (TableRole::Parent, Table::StoreSales),
                (TableRole::Child, Table::StoreReturns)
            ]
        );
        assert_eq!(Table::Store.family().members().count(), 1);
    }

    #[test]
    fn child_belongs_to_its_parent_family() {
        assert_eq!(Table::WebReturns.family(), Table::WebSales.family());
        assert_eq!(Table::WebReturns.role(), TableRole::Child);
        assert_eq!(Table::WebSales.role(), TableRole::Parent);
        assert_eq!(Table::Item.role(), TableRole::Parent);
    }

    #[test]
    fn row_counts_follow_scaling() {
        assert_eq!(Table::Store.row_count(1.0), 12);
        assert_eq!(Table::Store.row_count(10.0), 120);
        assert_eq!(Table::DateDim.row_count(100.0), 73_049);
        assert_eq!(Table::Warehouse.row_count(0.01), 1);
        assert_eq!(
            Table::StoreReturns.row_count(2.0),
            Table::StoreSales.row_count(2.0)
        );
    }
}
