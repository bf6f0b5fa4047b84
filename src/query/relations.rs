//! Relation names referenced by a SQL string.

use sqlparser::ast::{Query, TableFactor, Visit as _, Visitor};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::HashSet;
use std::ops::ControlFlow;

/// Tables the query reads from, in order of first appearance.
///
/// CTE names and table functions (`read_csv('...')`) are not relations.
/// Returns `None` if the SQL does not parse.
pub fn referenced_relations(sql: &str) -> Option<Vec<String>> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql).ok()?;

    let mut collector = RelationCollector::default();
    if statements.visit(&mut collector).is_break() {
        return None;
    }
    Some(collector.finish())
}

#[derive(Default)]
struct RelationCollector {
    relations: Vec<String>,
    ctes: HashSet<String>,
}

impl RelationCollector {
    fn finish(self) -> Vec<String> {
        let ctes = self.ctes;
        self.relations
            .into_iter()
            .filter(|r| !ctes.contains(r))
            .collect()
    }
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.ctes.insert(cte.alias.name.value.clone());
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<()> {
        if let TableFactor::Table {
            name, args: None, ..
        } = table_factor
        {
            let relation = name
                .0
                .iter()
                .map(|ident| ident.value.as_str())
                .collect::<Vec<_>>()
                .join(".");
            if !self.relations.contains(&relation) {
                self.relations.push(relation);
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relations(sql: &str) -> Vec<String> {
        referenced_relations(sql).unwrap_or_default()
    }

    #[test]
    fn test_simple_and_joined() {
        assert_eq!(relations("SELECT * FROM ghost"), vec!["ghost"]);
        assert_eq!(
            relations("SELECT * FROM sales s JOIN customers c ON s.id = c.id"),
            vec!["sales", "customers"]
        );
    }

    #[test]
    fn test_subqueries_and_duplicates() {
        assert_eq!(
            relations(
                "SELECT * FROM sales WHERE id IN (SELECT id FROM refunds) UNION ALL SELECT * FROM sales"
            ),
            vec!["sales", "refunds"]
        );
    }

    #[test]
    fn test_cte_names_are_not_relations() {
        assert_eq!(
            relations("WITH big AS (SELECT * FROM sales WHERE amount > 10) SELECT COUNT(*) FROM big"),
            vec!["sales"]
        );
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(relations(r#"SELECT * FROM "sales""#), vec!["sales"]);
    }

    #[test]
    fn test_no_relations() {
        assert!(relations("SELECT 1 AS one").is_empty());
    }

    #[test]
    fn test_unparseable() {
        assert!(referenced_relations("SELEKT * FROM").is_none());
    }
}
