//! Column layout configuration for sprint boards.

use super::{BoardDomainError, IssueStatus};
use serde::{Deserialize, Serialize};

/// One column shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Status key issues in this column carry.
    pub status: IssueStatus,
    /// Display name.
    pub name: String,
}

impl ColumnDefinition {
    /// Creates a column definition.
    #[must_use]
    pub fn new(status: IssueStatus, name: impl Into<String>) -> Self {
        Self {
            status,
            name: name.into(),
        }
    }
}

/// Ordered, validated set of board columns.
///
/// Each status key appears at most once. Statuses left out of the layout are
/// hidden: their issues are not materialized and moves into them are
/// rejected.
///
/// # Examples
///
/// ```
/// use sprintboard::board::domain::{BoardColumns, IssueStatus};
///
/// let columns = BoardColumns::default();
/// assert_eq!(columns.len(), 4);
/// assert_eq!(columns.name_for(IssueStatus::InReview), Some("In Review"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnDefinition>", into = "Vec<ColumnDefinition>")]
pub struct BoardColumns {
    columns: Vec<ColumnDefinition>,
}

impl Default for BoardColumns {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnDefinition::new(IssueStatus::Todo, "Todo"),
                ColumnDefinition::new(IssueStatus::InProgress, "In Progress"),
                ColumnDefinition::new(IssueStatus::InReview, "In Review"),
                ColumnDefinition::new(IssueStatus::Done, "Done"),
            ],
        }
    }
}

impl BoardColumns {
    /// Validates a column layout.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidColumns`] when the layout is empty,
    /// repeats a status, or has a blank column name.
    pub fn new(columns: Vec<ColumnDefinition>) -> Result<Self, BoardDomainError> {
        if columns.is_empty() {
            return Err(BoardDomainError::InvalidColumns(
                "at least one column is required".to_owned(),
            ));
        }
        for (position, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(BoardDomainError::InvalidColumns(format!(
                    "column {} has an empty name",
                    column.status
                )));
            }
            let repeated = columns
                .iter()
                .skip(position + 1)
                .any(|other| other.status == column.status);
            if repeated {
                return Err(BoardDomainError::InvalidColumns(format!(
                    "status {} appears more than once",
                    column.status
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Parses a JSON array of column definitions.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidColumns`] when the document is not
    /// valid JSON or fails layout validation.
    pub fn from_json(document: &str) -> Result<Self, BoardDomainError> {
        serde_json::from_str(document)
            .map_err(|err| BoardDomainError::InvalidColumns(err.to_string()))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether the layout is empty; never true for a validated layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column definitions in display order.
    #[must_use]
    pub fn definitions(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Iterates over the status keys in display order.
    pub fn statuses(&self) -> impl Iterator<Item = IssueStatus> + '_ {
        self.columns.iter().map(|column| column.status)
    }

    /// Returns whether `status` is displayed.
    #[must_use]
    pub fn contains(&self, status: IssueStatus) -> bool {
        self.columns.iter().any(|column| column.status == status)
    }

    /// Returns the display name for `status`.
    #[must_use]
    pub fn name_for(&self, status: IssueStatus) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.status == status)
            .map(|column| column.name.as_str())
    }
}

impl TryFrom<Vec<ColumnDefinition>> for BoardColumns {
    type Error = BoardDomainError;

    fn try_from(value: Vec<ColumnDefinition>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BoardColumns> for Vec<ColumnDefinition> {
    fn from(value: BoardColumns) -> Self {
        value.columns
    }
}
