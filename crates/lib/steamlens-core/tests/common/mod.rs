use std::collections::BTreeSet;

use sqlx::Row;
use steamlens_core::config::StoreConfig;
use steamlens_core::control::SteamControlPlane;
use steamlens_core::store::SqlStore;
use steamlens_store::schema::Taxonomy;

/// A game row plus its taxonomy, inserted into both views of the schema.
#[derive(Debug, Clone)]
pub struct GameFixture {
    pub app_id: i64,
    pub name: String,
    pub release_year: Option<i32>,
    pub price: f64,
    pub discount: i64,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    pub positive: i64,
    pub negative: i64,
    pub recommendations: i64,
    pub playtime: i64,
    pub metacritic: Option<i64>,
    pub publishers: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl GameFixture {
    pub fn new(app_id: i64, name: &str) -> Self {
        Self {
            app_id,
            name: name.to_string(),
            release_year: None,
            price: 0.0,
            discount: 0,
            windows: true,
            mac: false,
            linux: false,
            positive: 0,
            negative: 0,
            recommendations: 0,
            playtime: 0,
            metacritic: None,
            publishers: None,
            genres: Vec::new(),
            tags: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn released(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn discount(mut self, discount: i64) -> Self {
        self.discount = discount;
        self
    }

    pub fn platforms(mut self, windows: bool, mac: bool, linux: bool) -> Self {
        self.windows = windows;
        self.mac = mac;
        self.linux = linux;
        self
    }

    pub fn reviews(mut self, positive: i64, negative: i64) -> Self {
        self.positive = positive;
        self.negative = negative;
        self
    }

    pub fn recommendations(mut self, recommendations: i64) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn playtime(mut self, minutes: i64) -> Self {
        self.playtime = minutes;
        self
    }

    pub fn metacritic(mut self, score: i64) -> Self {
        self.metacritic = Some(score);
        self
    }

    pub fn publishers(mut self, publishers: &str) -> Self {
        self.publishers = Some(publishers.to_string());
        self
    }

    pub fn genres(mut self, names: &[&str]) -> Self {
        self.genres = names.iter().map(ToString::to_string).collect();
        self
    }

    pub fn tags(mut self, names: &[&str]) -> Self {
        self.tags = names.iter().map(ToString::to_string).collect();
        self
    }

    pub fn categories(mut self, names: &[&str]) -> Self {
        self.categories = names.iter().map(ToString::to_string).collect();
        self
    }

    fn names(&self, taxonomy: Taxonomy) -> &[String] {
        match taxonomy {
            Taxonomy::Genre => &self.genres,
            Taxonomy::Tag => &self.tags,
            Taxonomy::Category => &self.categories,
        }
    }

    fn joined(&self, taxonomy: Taxonomy) -> Option<String> {
        let names = self.names(taxonomy);
        (!names.is_empty()).then(|| names.join(","))
    }
}

pub async fn empty_store() -> SqlStore {
    let store = SqlStore::connect(&StoreConfig::in_memory())
        .await
        .expect("failed to open in-memory store");
    store.apply_schema().await.expect("failed to apply schema");
    store
}

pub async fn control_with(games: &[GameFixture]) -> SteamControlPlane {
    let store = empty_store().await;
    seed(&store, games).await;
    SteamControlPlane::with_store(store)
}

pub async fn seed(store: &SqlStore, games: &[GameFixture]) {
    for game in games {
        sqlx::query(
            "INSERT INTO games (app_id, name, release_date, release_year, price, discount, \
             windows, mac, linux, metacritic_score, positive_reviews, negative_reviews, \
             recommendations, avg_playtime_forever, publishers, genres, tags, categories) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game.app_id)
        .bind(game.name.clone())
        .bind(game.release_year.map(|year| format!("{year}-01-01")))
        .bind(game.release_year)
        .bind(game.price)
        .bind(game.discount)
        .bind(i64::from(game.windows))
        .bind(i64::from(game.mac))
        .bind(i64::from(game.linux))
        .bind(game.metacritic)
        .bind(game.positive)
        .bind(game.negative)
        .bind(game.recommendations)
        .bind(game.playtime)
        .bind(game.publishers.clone())
        .bind(game.joined(Taxonomy::Genre))
        .bind(game.joined(Taxonomy::Tag))
        .bind(game.joined(Taxonomy::Category))
        .execute(store.pool())
        .await
        .unwrap_or_else(|err| panic!("failed to insert game {}: {err}", game.app_id));
    }

    for taxonomy in Taxonomy::ALL {
        let names: BTreeSet<&str> = games
            .iter()
            .flat_map(|game| game.names(taxonomy).iter().map(String::as_str))
            .collect();
        for (index, name) in names.iter().enumerate() {
            insert_dimension(store, taxonomy, dimension_id(index), name).await;
        }
        for game in games {
            for name in game.names(taxonomy) {
                let position = names
                    .iter()
                    .position(|candidate| *candidate == name.as_str())
                    .expect("name was collected above");
                sqlx::query(&format!(
                    "INSERT INTO {} (game_id, {}) VALUES (?, ?)",
                    taxonomy.link_table(),
                    taxonomy.link_column()
                ))
                .bind(game.app_id)
                .bind(dimension_id(position))
                .execute(store.pool())
                .await
                .expect("failed to link taxonomy");
            }
        }
    }
}

/// Inserts a dimension row no game links to.
pub async fn insert_orphan(store: &SqlStore, taxonomy: Taxonomy, name: &str) {
    insert_dimension(store, taxonomy, 10_000, name).await;
}

pub async fn count_rows(store: &SqlStore, table: &str) -> i64 {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("failed to count rows");
    row.try_get::<i64, _>("n").expect("count column")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

async fn insert_dimension(store: &SqlStore, taxonomy: Taxonomy, id: i64, name: &str) {
    sqlx::query(&format!("INSERT INTO {} (id, name) VALUES (?, ?)", taxonomy.table()))
        .bind(id)
        .bind(name.to_string())
        .execute(store.pool())
        .await
        .expect("failed to insert dimension row");
}

fn dimension_id(index: usize) -> i64 {
    i64::try_from(index).expect("fixture index fits i64") + 1
}
