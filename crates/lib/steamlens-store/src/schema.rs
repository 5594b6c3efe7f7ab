//! Relational schema for the games dataset.
//!
//! Columns are described once and rendered per dialect, so the DDL and the
//! read projection used by the query layer cannot drift apart.

use std::fmt;

pub const TABLE_GAMES: &str = "games";
pub const TABLE_GENRES: &str = "genres";
pub const TABLE_TAGS: &str = "tags";
pub const TABLE_CATEGORIES: &str = "categories";
pub const TABLE_GAME_GENRES: &str = "game_genres";
pub const TABLE_GAME_TAGS: &str = "game_tags";
pub const TABLE_GAME_CATEGORIES: &str = "game_categories";

/// SQL dialect of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    /// Infers the dialect from a connection URL scheme.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':')?.0.to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class of a `games` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Year,
    Price,
    Flag,
    Date,
    ShortText,
    LongText,
}

impl ColumnKind {
    #[must_use]
    pub const fn sql_type(self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (Self::Integer, Dialect::MySql) => "INT",
            (Self::Year, Dialect::MySql) => "SMALLINT",
            (Self::Price, Dialect::MySql) => "DECIMAL(10,2)",
            (Self::Flag, Dialect::MySql) => "BOOLEAN",
            (Self::Date, Dialect::MySql) => "DATE",
            (Self::ShortText, Dialect::MySql) => "VARCHAR(500)",
            (Self::LongText, Dialect::MySql) => "TEXT",
            (Self::Integer | Self::Year | Self::Flag, Dialect::Sqlite) => "INTEGER",
            (Self::Price, Dialect::Sqlite) => "REAL",
            (Self::Date | Self::ShortText | Self::LongText, Dialect::Sqlite) => "TEXT",
        }
    }

    /// Portable `CAST` target used when reading the column.
    ///
    /// Both dialects accept `SIGNED`, `DOUBLE` and `CHAR`, and each maps to a
    /// type the driver-agnostic row decoder understands.
    #[must_use]
    pub const fn cast_target(self) -> &'static str {
        match self {
            Self::Integer | Self::Year | Self::Flag => "SIGNED",
            Self::Price => "DOUBLE",
            Self::Date | Self::ShortText | Self::LongText => "CHAR",
        }
    }
}

/// A column of the `games` fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub check: Option<&'static str>,
}

impl Column {
    const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            check: None,
        }
    }

    const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            check: None,
        }
    }

    const fn checked(mut self, check: &'static str) -> Self {
        self.check = Some(check);
        self
    }

    /// Renders the column definition for a `CREATE TABLE` statement.
    #[must_use]
    pub fn definition(&self, dialect: Dialect) -> String {
        let mut out = format!("{} {}", self.name, self.kind.sql_type(dialect));
        if self.name == PRIMARY_KEY {
            out.push_str(" NOT NULL PRIMARY KEY");
        } else if self.nullable {
            out.push_str(" NULL");
        } else if matches!(self.kind, ColumnKind::ShortText | ColumnKind::LongText) {
            out.push_str(" NOT NULL");
        } else {
            out.push_str(" NOT NULL DEFAULT 0");
        }
        if let Some(check) = self.check {
            out.push_str(" CHECK (");
            out.push_str(check);
            out.push(')');
        }
        out
    }
}

pub const PRIMARY_KEY: &str = "app_id";

/// Columns of the `games` table, in declaration order.
pub const GAME_COLUMNS: &[Column] = &[
    Column::required("app_id", ColumnKind::Integer),
    Column::required("name", ColumnKind::ShortText),
    Column::optional("release_date", ColumnKind::Date),
    Column::optional("release_year", ColumnKind::Year),
    Column::optional("estimated_owners", ColumnKind::ShortText),
    Column::required("peak_ccu", ColumnKind::Integer).checked("peak_ccu >= 0"),
    Column::required("required_age", ColumnKind::Integer),
    Column::required("price", ColumnKind::Price).checked("price >= 0"),
    Column::required("discount", ColumnKind::Integer).checked("discount BETWEEN 0 AND 100"),
    Column::required("dlc_count", ColumnKind::Integer),
    Column::optional("about_the_game", ColumnKind::LongText),
    Column::optional("supported_languages", ColumnKind::LongText),
    Column::optional("header_image", ColumnKind::ShortText),
    Column::optional("website", ColumnKind::ShortText),
    Column::required("windows", ColumnKind::Flag),
    Column::required("mac", ColumnKind::Flag),
    Column::required("linux", ColumnKind::Flag),
    Column::optional("metacritic_score", ColumnKind::Integer)
        .checked("metacritic_score BETWEEN 0 AND 100"),
    Column::required("user_score", ColumnKind::Integer),
    Column::required("positive_reviews", ColumnKind::Integer).checked("positive_reviews >= 0"),
    Column::required("negative_reviews", ColumnKind::Integer).checked("negative_reviews >= 0"),
    Column::required("achievements", ColumnKind::Integer),
    Column::required("recommendations", ColumnKind::Integer),
    Column::required("avg_playtime_forever", ColumnKind::Integer),
    Column::required("avg_playtime_2weeks", ColumnKind::Integer),
    Column::required("median_playtime_forever", ColumnKind::Integer),
    Column::required("median_playtime_2weeks", ColumnKind::Integer),
    Column::optional("developers", ColumnKind::LongText),
    Column::optional("publishers", ColumnKind::LongText),
    Column::optional("categories", ColumnKind::LongText),
    Column::optional("genres", ColumnKind::LongText),
    Column::optional("tags", ColumnKind::LongText),
];

/// Secondary indexes on `games` backing the common filters.
const GAME_INDEXES: &[(&str, &str)] = &[
    ("idx_games_release_year", "release_year"),
    ("idx_games_price", "price"),
    ("idx_games_positive_reviews", "positive_reviews"),
];

/// One of the three normalized taxonomy dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    Genre,
    Tag,
    Category,
}

impl Taxonomy {
    pub const ALL: [Self; 3] = [Self::Genre, Self::Tag, Self::Category];

    /// Dimension table holding the distinct names.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Genre => TABLE_GENRES,
            Self::Tag => TABLE_TAGS,
            Self::Category => TABLE_CATEGORIES,
        }
    }

    /// Association table linking games to the dimension.
    #[must_use]
    pub const fn link_table(self) -> &'static str {
        match self {
            Self::Genre => TABLE_GAME_GENRES,
            Self::Tag => TABLE_GAME_TAGS,
            Self::Category => TABLE_GAME_CATEGORIES,
        }
    }

    /// Foreign key column in the association table.
    #[must_use]
    pub const fn link_column(self) -> &'static str {
        match self {
            Self::Genre => "genre_id",
            Self::Tag => "tag_id",
            Self::Category => "category_id",
        }
    }

    /// Denormalized comma-joined column on `games`.
    #[must_use]
    pub const fn raw_column(self) -> &'static str {
        match self {
            Self::Genre => "genres",
            Self::Tag => "tags",
            Self::Category => "categories",
        }
    }
}

/// Builds the `CREATE TABLE`/`CREATE INDEX` statements for a dialect.
///
/// Statements are idempotent and ordered so foreign keys resolve.
#[must_use]
pub fn create_statements(dialect: Dialect) -> Vec<String> {
    let mut statements = Vec::new();
    statements.push(create_games(dialect));
    for taxonomy in Taxonomy::ALL {
        statements.push(create_dimension(dialect, taxonomy));
        statements.push(create_link(dialect, taxonomy));
    }
    if dialect == Dialect::Sqlite {
        for (index, column) in GAME_INDEXES {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS {index} ON {TABLE_GAMES} ({column})"
            ));
        }
        for taxonomy in Taxonomy::ALL {
            let link = taxonomy.link_table();
            let column = taxonomy.link_column();
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{link}_{column} ON {link} ({column})"
            ));
        }
    }
    statements
}

fn create_games(dialect: Dialect) -> String {
    let mut parts: Vec<String> = GAME_COLUMNS
        .iter()
        .map(|column| column.definition(dialect))
        .collect();
    if dialect == Dialect::MySql {
        parts.extend(
            GAME_INDEXES
                .iter()
                .map(|(index, column)| format!("INDEX {index} ({column})")),
        );
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {TABLE_GAMES} ({}){}",
        parts.join(", "),
        table_options(dialect)
    )
}

fn create_dimension(dialect: Dialect, taxonomy: Taxonomy) -> String {
    let table = taxonomy.table();
    let columns = match dialect {
        Dialect::MySql => "id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(255) NOT NULL UNIQUE",
        Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE",
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({columns}, CHECK (name <> '')){}",
        table_options(dialect)
    )
}

fn create_link(dialect: Dialect, taxonomy: Taxonomy) -> String {
    let link = taxonomy.link_table();
    let table = taxonomy.table();
    let column = taxonomy.link_column();
    let int = ColumnKind::Integer.sql_type(dialect);
    format!(
        "CREATE TABLE IF NOT EXISTS {link} (\
         game_id {int} NOT NULL, \
         {column} {int} NOT NULL, \
         PRIMARY KEY (game_id, {column}), \
         FOREIGN KEY (game_id) REFERENCES {TABLE_GAMES}({PRIMARY_KEY}) ON DELETE CASCADE, \
         FOREIGN KEY ({column}) REFERENCES {table}(id) ON DELETE CASCADE){}",
        table_options(dialect)
    )
}

const fn table_options(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        Dialect::Sqlite => "",
    }
}
