mod common;

use futures::TryStreamExt;
use steamlens_core::control::{
    DiscountPatternsRequest,
    ErrorKind,
    GenrePlaytimeRequest,
    GenreStatisticsRequest,
    PriceStatisticsRequest,
    PriceTrendRequest,
    PublisherSatisfactionRequest,
    SearchGamesRequest,
    SteamControlPlane,
    TopRatedRequest,
};
use steamlens_store::schema::Taxonomy;
use steamlens_store::{DatasetSummary, Platform, PriceStatistics};

use common::{GameFixture, assert_close, control_with, count_rows, empty_store, insert_orphan};

fn app_ids<T>(rows: &[T], app_id: impl Fn(&T) -> i64) -> Vec<i64> {
    rows.iter().map(app_id).collect()
}

async fn search(control: &SteamControlPlane, request: SearchGamesRequest) -> Vec<i64> {
    let games = control
        .search_games(request)
        .await
        .expect("search should succeed");
    app_ids(&games, |game| game.app_id)
}

fn search_catalog() -> Vec<GameFixture> {
    vec![
        GameFixture::new(1, "Portal")
            .price(9.99)
            .reviews(500, 10)
            .platforms(true, true, true)
            .genres(&["Puzzle"]),
        GameFixture::new(2, "Portal 2")
            .price(19.99)
            .reviews(900, 20)
            .platforms(true, true, false)
            .genres(&["Puzzle", "Action"]),
        GameFixture::new(3, "Doom")
            .price(4.99)
            .reviews(300, 50)
            .genres(&["Action"]),
        GameFixture::new(4, "100% Orange Juice")
            .reviews(50, 5)
            .genres(&["Casual"]),
    ]
}

#[tokio::test]
async fn search_orders_by_positive_reviews() {
    let control = control_with(&search_catalog()).await;

    assert_eq!(search(&control, SearchGamesRequest::default()).await, vec![2, 1, 3, 4]);
    assert_eq!(
        search(
            &control,
            SearchGamesRequest {
                limit: Some(1),
                ..SearchGamesRequest::default()
            }
        )
        .await,
        vec![2]
    );
}

#[tokio::test]
async fn search_filters_narrow_results() {
    let control = control_with(&search_catalog()).await;
    let everything = search(&control, SearchGamesRequest::default()).await;

    let by_name = search(
        &control,
        SearchGamesRequest {
            name: Some("portal".to_string()),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(by_name, vec![2, 1]);

    let by_name_and_platform = search(
        &control,
        SearchGamesRequest {
            name: Some("portal".to_string()),
            platform: Some(Platform::Linux),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(by_name_and_platform, vec![1]);

    let by_genre = search(
        &control,
        SearchGamesRequest {
            genre: Some("ACTION".to_string()),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(by_genre, vec![2, 3]);

    let by_price = search(
        &control,
        SearchGamesRequest {
            min_price: Some(5.0),
            max_price: Some(20.0),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(by_price, vec![2, 1]);

    let by_reviews = search(
        &control,
        SearchGamesRequest {
            min_positive_reviews: Some(400),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(by_reviews, vec![2, 1]);

    for subset in [&by_name, &by_name_and_platform, &by_genre, &by_price, &by_reviews] {
        assert!(subset.iter().all(|id| everything.contains(id)));
    }
    assert!(by_name_and_platform.iter().all(|id| by_name.contains(id)));
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let control = control_with(&search_catalog()).await;

    let percent = search(
        &control,
        SearchGamesRequest {
            name: Some("%".to_string()),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(percent, vec![4]);

    let nothing = search(
        &control,
        SearchGamesRequest {
            name: Some("half-life".to_string()),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn search_rejects_invalid_arguments() {
    let control = control_with(&search_catalog()).await;

    let inverted = control
        .search_games(SearchGamesRequest {
            min_price: Some(30.0),
            max_price: Some(10.0),
            ..SearchGamesRequest::default()
        })
        .await
        .expect_err("inverted bounds should fail");
    assert_eq!(inverted.kind(), ErrorKind::InvalidArgument);
    assert_eq!(inverted.operation(), Some("search_games"));

    let zero_limit = control
        .search_games(SearchGamesRequest {
            limit: Some(0),
            ..SearchGamesRequest::default()
        })
        .await
        .expect_err("zero limit should fail");
    assert_eq!(zero_limit.kind(), ErrorKind::InvalidArgument);

    let clamped = search(
        &control,
        SearchGamesRequest {
            limit: Some(10_000),
            ..SearchGamesRequest::default()
        },
    )
    .await;
    assert_eq!(clamped.len(), 4);
}

#[tokio::test]
async fn game_details_resolve_taxonomy_names() {
    let control = control_with(&[GameFixture::new(10, "Counter-Strike")
        .released(2000)
        .price(9.99)
        .metacritic(88)
        .platforms(true, true, true)
        .genres(&["Indie", "Action"])
        .tags(&["Shooter"])
        .categories(&["Multi-player", "Anti-Cheat"])])
    .await;

    let detail = control
        .get_game_details(10)
        .await
        .expect("game should exist");

    assert_eq!(detail.game.name, "Counter-Strike");
    assert_eq!(detail.game.release_year, Some(2000));
    assert_eq!(detail.game.release_date.as_deref(), Some("2000-01-01"));
    assert_eq!(detail.game.metacritic_score, Some(88));
    assert!(detail.game.linux);
    assert_close(detail.game.price, 9.99);
    assert_eq!(detail.genre_names, vec!["Action", "Indie"]);
    assert_eq!(detail.tag_names, vec!["Shooter"]);
    assert_eq!(detail.category_names, vec!["Anti-Cheat", "Multi-player"]);
    assert_eq!(detail.game.genres.as_deref(), Some("Indie,Action"));

    let missing = control
        .get_game_details(999)
        .await
        .expect_err("missing game should fail");
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let invalid = control
        .get_game_details(0)
        .await
        .expect_err("zero id should fail");
    assert_eq!(invalid.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn price_statistics_over_three_games() {
    let control = control_with(&[
        GameFixture::new(1, "Free"),
        GameFixture::new(2, "Ten").price(10.0),
        GameFixture::new(3, "Twenty").price(20.0),
    ])
    .await;

    let stats = control
        .price_statistics(PriceStatisticsRequest::default())
        .await
        .expect("statistics should succeed");

    assert_eq!(stats.game_count, 3);
    assert_close(stats.mean_price.expect("mean"), 10.0);
    assert_close(stats.median_price.expect("median"), 10.0);
    assert_close(stats.min_price.expect("min"), 0.0);
    assert_close(stats.max_price.expect("max"), 20.0);
    assert_eq!(stats.buckets.free, 1);
    assert_eq!(stats.buckets.up_to_5, 0);
    assert_eq!(stats.buckets.from_5_to_20, 2);
    assert_eq!(stats.buckets.total(), stats.game_count);
}

#[tokio::test]
async fn price_statistics_median_and_scopes() {
    let control = control_with(&[
        GameFixture::new(1, "A").price(1.0).released(2019).genres(&["Indie"]),
        GameFixture::new(2, "B").price(3.0).released(2020).genres(&["Indie"]),
        GameFixture::new(3, "C").price(5.0).released(2020).genres(&["Action"]),
        GameFixture::new(4, "D").price(100.0).released(2020).genres(&["Action"]),
    ])
    .await;

    let all = control
        .price_statistics(PriceStatisticsRequest::default())
        .await
        .expect("statistics should succeed");
    assert_close(all.median_price.expect("median"), 4.0);
    assert_eq!(all.buckets.above_60, 1);
    let min = all.min_price.expect("min");
    let max = all.max_price.expect("max");
    let mean = all.mean_price.expect("mean");
    let median = all.median_price.expect("median");
    assert!(min <= median && median <= max);
    assert!(min <= mean && mean <= max);

    let indie = control
        .price_statistics(PriceStatisticsRequest {
            genre: Some("indie".to_string()),
            year: None,
        })
        .await
        .expect("statistics should succeed");
    assert_eq!(indie.game_count, 2);
    assert_close(indie.median_price.expect("median"), 2.0);

    let year = control
        .price_statistics(PriceStatisticsRequest {
            genre: None,
            year: Some(2020),
        })
        .await
        .expect("statistics should succeed");
    assert_eq!(year.game_count, 3);
    assert_close(year.median_price.expect("median"), 5.0);

    let empty = control
        .price_statistics(PriceStatisticsRequest {
            genre: Some("Nope".to_string()),
            year: None,
        })
        .await
        .expect("empty scope should succeed");
    assert_eq!(empty, PriceStatistics::default());
}

#[tokio::test]
async fn price_trend_streams_years_in_order() {
    let control = control_with(&[
        GameFixture::new(1, "A").released(2015).price(10.0),
        GameFixture::new(2, "B").released(2015).price(20.0),
        GameFixture::new(3, "C").released(2017).price(30.0),
        GameFixture::new(4, "D").released(2017),
        GameFixture::new(5, "E").released(1960).price(5.0),
        GameFixture::new(6, "F").price(8.0),
    ])
    .await;

    let all: Vec<_> = control
        .price_trend_by_year(PriceTrendRequest::default())
        .try_collect()
        .await
        .expect("trend should succeed");
    let years: Vec<_> = all.iter().map(|row| row.year).collect();
    assert_eq!(years, vec![2015, 2017]);
    assert_eq!(all[0].game_count, 2);
    assert_close(all[0].mean_price, 15.0);
    assert_eq!(all[1].game_count, 2);
    assert_close(all[1].mean_price, 15.0);
    assert_close(all[1].diff_from_overall, 0.0);

    let paid: Vec<_> = control
        .price_trend_by_year(PriceTrendRequest { exclude_free: true })
        .try_collect()
        .await
        .expect("trend should succeed");
    assert_eq!(paid[0].game_count, 2);
    assert_close(paid[0].diff_from_overall, -5.0);
    assert_eq!(paid[1].game_count, 1);
    assert_close(paid[1].mean_price, 30.0);
    assert_close(paid[1].diff_from_overall, 10.0);
}

#[tokio::test]
async fn price_trend_counts_free_games_by_default() {
    let control = control_with(&[
        GameFixture::new(1, "Free").released(2015),
        GameFixture::new(2, "Paid").released(2015).price(20.0),
    ])
    .await;

    let trend: Vec<_> = control
        .price_trend_by_year(PriceTrendRequest::default())
        .try_collect()
        .await
        .expect("trend should succeed");
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].year, 2015);
    assert_eq!(trend[0].game_count, 2);
    assert_close(trend[0].mean_price, 10.0);
}

#[tokio::test]
async fn genre_statistics_count_association_rows() {
    let control = control_with(&[
        GameFixture::new(1, "A")
            .price(10.0)
            .playtime(60)
            .reviews(100, 0)
            .genres(&["Action", "Indie"]),
        GameFixture::new(2, "B")
            .price(20.0)
            .playtime(120)
            .reviews(300, 0)
            .genres(&["Action"]),
        GameFixture::new(3, "C").genres(&["Indie"]),
        GameFixture::new(4, "D"),
    ])
    .await;
    insert_orphan(control.store(), Taxonomy::Genre, "Empty").await;

    let genres = control
        .genre_statistics(GenreStatisticsRequest::default())
        .await
        .expect("genre statistics should succeed");

    let names: Vec<_> = genres.iter().map(|row| row.genre.as_str()).collect();
    assert_eq!(names, vec!["Action", "Indie"]);
    assert_close(genres[0].mean_price, 15.0);
    assert_close(genres[0].mean_playtime_minutes, 90.0);
    assert_close(genres[0].mean_positive_reviews, 200.0);
    assert_close(genres[1].mean_price, 5.0);

    let total: i64 = genres.iter().map(|row| row.game_count).sum();
    assert_eq!(total, count_rows(control.store(), "game_genres").await);

    let top = control
        .genre_statistics(GenreStatisticsRequest { top_n: Some(1) })
        .await
        .expect("genre statistics should succeed");
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn genre_statistics_cover_every_linked_genre() {
    let names: Vec<String> = (1..=20).map(|index| format!("Genre {index:02}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let control = control_with(&[
        GameFixture::new(1, "Sprawling").genres(&refs),
        GameFixture::new(2, "Focused").genres(&refs[..3]),
    ])
    .await;

    let genres = control
        .genre_statistics(GenreStatisticsRequest::default())
        .await
        .expect("genre statistics should succeed");
    assert_eq!(genres.len(), 20);
    let total: i64 = genres.iter().map(|row| row.game_count).sum();
    assert_eq!(total, 23);
    assert_eq!(total, count_rows(control.store(), "game_genres").await);

    let wide = control
        .genre_statistics(GenreStatisticsRequest { top_n: Some(500) })
        .await
        .expect("genre statistics should succeed");
    assert_eq!(wide.len(), 20);

    let err = control
        .genre_statistics(GenreStatisticsRequest { top_n: Some(0) })
        .await
        .expect_err("zero top_n should be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn genre_playtime_uses_played_games_only() {
    let control = control_with(&[
        GameFixture::new(1, "A").price(10.0).playtime(60).genres(&["Action", "Indie"]),
        GameFixture::new(2, "B").price(20.0).playtime(120).genres(&["Action"]),
        GameFixture::new(3, "C").genres(&["Indie"]),
    ])
    .await;

    let genres = control
        .genre_playtime_analysis(GenrePlaytimeRequest {
            min_games: Some(1),
            limit: None,
        })
        .await
        .expect("playtime analysis should succeed");
    let names: Vec<_> = genres.iter().map(|row| row.genre.as_str()).collect();
    assert_eq!(names, vec!["Action", "Indie"]);
    assert_close(genres[0].mean_playtime_hours, 1.5);
    assert_close(genres[0].price_per_hour.expect("played"), 10.0);
    assert_eq!(genres[1].game_count, 1);

    let strict = control
        .genre_playtime_analysis(GenrePlaytimeRequest {
            min_games: Some(2),
            limit: None,
        })
        .await
        .expect("playtime analysis should succeed");
    assert_eq!(strict.len(), 1);

    let default = control
        .genre_playtime_analysis(GenrePlaytimeRequest::default())
        .await
        .expect("playtime analysis should succeed");
    assert!(default.is_empty());
}

#[tokio::test]
async fn platform_ratios_ignore_unreviewed_games() {
    let control = control_with(&[
        GameFixture::new(1, "A").reviews(80, 20),
        GameFixture::new(2, "B").reviews(50, 50).platforms(true, true, false),
        GameFixture::new(3, "C").platforms(true, true, false),
    ])
    .await;

    let platforms = control
        .compare_platform_reviews()
        .await
        .expect("platform comparison should succeed");
    let order: Vec<_> = platforms.iter().map(|row| row.platform).collect();
    assert_eq!(order, Platform::ALL.to_vec());

    assert_eq!(platforms[0].game_count, 3);
    assert_eq!(platforms[0].reviewed_games, 2);
    assert_close(platforms[0].mean_positive_ratio.expect("windows ratio"), 0.65);
    assert_eq!(platforms[1].reviewed_games, 1);
    assert_close(platforms[1].mean_positive_ratio.expect("mac ratio"), 0.5);
    assert_eq!(platforms[2].game_count, 0);
    assert_eq!(platforms[2].mean_positive_ratio, None);

    for row in &platforms {
        if let Some(ratio) = row.mean_positive_ratio {
            assert!((0.0..=1.0).contains(&ratio));
        }
    }
}

#[tokio::test]
async fn ratio_buckets_skip_empty_quartiles() {
    let control = control_with(&[
        GameFixture::new(1, "A").reviews(1, 9).recommendations(10),
        GameFixture::new(2, "B").reviews(3, 1).recommendations(30),
        GameFixture::new(3, "C").reviews(10, 0).recommendations(50),
        GameFixture::new(4, "D").recommendations(1_000),
    ])
    .await;

    let buckets = control
        .reviews_vs_recommendations()
        .await
        .expect("correlation should succeed");

    let labels: Vec<_> = buckets.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["0-25%", "75-100%"]);
    assert_eq!(buckets[0].game_count, 1);
    assert_close(buckets[0].mean_recommendations, 10.0);
    assert_eq!(buckets[1].game_count, 2);
    assert_close(buckets[1].mean_recommendations, 40.0);
    assert_close(buckets[1].mean_positive_ratio, 0.875);

    let empty = control_with(&[GameFixture::new(1, "Unreviewed")]).await;
    assert!(
        empty
            .reviews_vs_recommendations()
            .await
            .expect("correlation should succeed")
            .is_empty()
    );
}

#[tokio::test]
async fn publishers_rank_by_mean_ratio() {
    let control = control_with(&[
        GameFixture::new(1, "A").publishers("Valve").reviews(90, 10).price(10.0),
        GameFixture::new(2, "B").publishers("Valve, Sega").reviews(50, 50).price(20.0),
        GameFixture::new(3, "C").publishers("Sega").reviews(100, 0).price(30.0),
        GameFixture::new(4, "D").publishers("Sega").reviews(3, 0),
        GameFixture::new(5, "E").publishers("Tiny").reviews(10, 0),
    ])
    .await;

    let ranked = control
        .publisher_satisfaction(PublisherSatisfactionRequest {
            min_games: Some(2),
            ..PublisherSatisfactionRequest::default()
        })
        .await
        .expect("ranking should succeed");
    let names: Vec<_> = ranked.iter().map(|row| row.publisher.as_str()).collect();
    assert_eq!(names, vec!["Sega", "Valve"]);
    assert_eq!(ranked[0].game_count, 2);
    assert_close(ranked[0].mean_positive_ratio, 0.75);
    assert_close(ranked[1].mean_positive_ratio, 0.7);
    assert_close(ranked[1].mean_price, 15.0);

    let lenient = control
        .publisher_satisfaction(PublisherSatisfactionRequest {
            min_games: Some(2),
            min_reviews: Some(0),
            top_n: Some(1),
        })
        .await
        .expect("ranking should succeed");
    assert_eq!(lenient.len(), 1);
    assert_eq!(lenient[0].game_count, 3);

    let defaults = control
        .publisher_satisfaction(PublisherSatisfactionRequest::default())
        .await
        .expect("ranking should succeed");
    assert!(defaults.is_empty());
}

#[tokio::test]
async fn discount_bands_measure_age_from_reference_year() {
    let control = control_with(&[
        GameFixture::new(1, "A").released(2024).discount(10).price(10.0),
        GameFixture::new(2, "B").released(2023).discount(60).price(20.0),
        GameFixture::new(3, "C").released(2022).discount(40).price(40.0),
        GameFixture::new(4, "D").released(2010).discount(90).price(5.0),
        GameFixture::new(5, "E").released(2030).discount(20),
        GameFixture::new(6, "F").discount(20),
    ])
    .await;

    let bands = control
        .discount_patterns(DiscountPatternsRequest {
            as_of_year: Some(2024),
        })
        .await
        .expect("discount analysis should succeed");

    let labels: Vec<_> = bands.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["0 years", "1-2 years", "6+ years"]);
    assert_eq!(bands[0].game_count, 1);
    assert_close(bands[0].mean_discount, 10.0);
    assert_eq!(bands[1].game_count, 2);
    assert_close(bands[1].mean_discount, 50.0);
    assert_eq!(bands[1].large_discounts, 1);
    assert_close(bands[1].mean_price, 30.0);
    assert_eq!(bands[2].min_age, 6);
    assert_eq!(bands[2].max_age, None);
    assert_eq!(bands[2].large_discounts, 1);
}

#[tokio::test]
async fn top_rated_default_threshold_excludes_small_samples() {
    let control = control_with(&[
        GameFixture::new(1, "Tiny").reviews(5, 0),
        GameFixture::new(2, "Solid").reviews(90, 10).genres(&["RPG"]),
        GameFixture::new(3, "Unreviewed"),
        GameFixture::new(4, "Popular").reviews(180, 20).genres(&["Strategy"]),
    ])
    .await;

    let default = control
        .top_rated_games(TopRatedRequest::default())
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&default, |row| row.game.app_id), vec![4, 2]);
    assert_eq!(default[1].total_reviews, 100);
    assert_close(default[1].positive_ratio, 0.9);

    let everything = control
        .top_rated_games(TopRatedRequest {
            min_reviews: Some(0),
            ..TopRatedRequest::default()
        })
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&everything, |row| row.game.app_id), vec![1, 4, 2]);

    let rpg = control
        .top_rated_games(TopRatedRequest {
            min_reviews: Some(0),
            genre: Some("rpg".to_string()),
            limit: None,
        })
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&rpg, |row| row.game.app_id), vec![2]);

    let negative = control
        .top_rated_games(TopRatedRequest {
            min_reviews: Some(-1),
            ..TopRatedRequest::default()
        })
        .await
        .expect_err("negative threshold should fail");
    assert_eq!(negative.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn top_rated_small_sample_needs_explicit_zero_threshold() {
    let control = control_with(&[
        GameFixture::new(1, "Established").reviews(80, 20),
        GameFixture::new(2, "Handful").reviews(5, 0),
    ])
    .await;

    let default = control
        .top_rated_games(TopRatedRequest::default())
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&default, |row| row.game.app_id), vec![1]);
    assert_close(default[0].positive_ratio, 0.8);

    let above_five = control
        .top_rated_games(TopRatedRequest {
            min_reviews: Some(6),
            ..TopRatedRequest::default()
        })
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&above_five, |row| row.game.app_id), vec![1]);

    let unfiltered = control
        .top_rated_games(TopRatedRequest {
            min_reviews: Some(0),
            ..TopRatedRequest::default()
        })
        .await
        .expect("ranking should succeed");
    assert_eq!(app_ids(&unfiltered, |row| row.game.app_id), vec![2, 1]);
}

#[tokio::test]
async fn dataset_summary_totals_fixture() {
    let control = control_with(&[
        GameFixture::new(1, "A")
            .released(2000)
            .platforms(true, true, true)
            .reviews(90, 10)
            .playtime(120)
            .metacritic(80)
            .genres(&["Action"])
            .tags(&["FPS"])
            .categories(&["Multi-player"]),
        GameFixture::new(2, "B")
            .released(2010)
            .price(10.0)
            .reviews(50, 50)
            .metacritic(0)
            .genres(&["Indie"])
            .tags(&["FPS", "Retro"]),
        GameFixture::new(3, "C")
            .price(20.0)
            .platforms(true, false, true)
            .playtime(60),
    ])
    .await;

    let summary = control
        .dataset_summary()
        .await
        .expect("summary should succeed");

    assert_eq!(summary.total_games, 3);
    assert_eq!(summary.total_genres, 2);
    assert_eq!(summary.total_tags, 2);
    assert_eq!(summary.total_categories, 1);
    assert_eq!(summary.free_games, 1);
    assert_eq!(summary.windows_games, 3);
    assert_eq!(summary.mac_games, 1);
    assert_eq!(summary.linux_games, 2);
    assert_eq!(summary.earliest_release.as_deref(), Some("2000-01-01"));
    assert_eq!(summary.latest_release.as_deref(), Some("2010-01-01"));
    assert_eq!(summary.earliest_year, Some(2000));
    assert_eq!(summary.latest_year, Some(2010));
    assert_close(summary.mean_price.expect("mean price"), 10.0);
    assert_close(summary.mean_positive_ratio.expect("mean ratio"), 0.7);
    assert_close(summary.mean_playtime_hours.expect("mean playtime"), 1.0);
    assert_close(summary.mean_metacritic.expect("mean metacritic"), 80.0);
}

#[tokio::test]
async fn empty_dataset_reports_zeroes_and_nulls() {
    let control = SteamControlPlane::with_store(empty_store().await);

    let summary = control
        .dataset_summary()
        .await
        .expect("summary should succeed");
    assert_eq!(summary, DatasetSummary::default());

    let stats = control
        .price_statistics(PriceStatisticsRequest::default())
        .await
        .expect("statistics should succeed");
    assert_eq!(stats, PriceStatistics::default());

    let platforms = control
        .compare_platform_reviews()
        .await
        .expect("platform comparison should succeed");
    assert!(platforms.iter().all(|row| row.mean_positive_ratio.is_none()));
}

#[tokio::test]
async fn deleting_a_game_cascades_to_links() {
    let control = control_with(&[GameFixture::new(7, "Linked")
        .genres(&["Action"])
        .tags(&["Retro"])
        .categories(&["Single-player"])])
    .await;
    let store = control.store();
    assert_eq!(count_rows(store, "game_genres").await, 1);

    sqlx::query("DELETE FROM games WHERE app_id = ?")
        .bind(7_i64)
        .execute(store.pool())
        .await
        .expect("delete should succeed");

    for taxonomy in Taxonomy::ALL {
        assert_eq!(count_rows(store, taxonomy.link_table()).await, 0);
        assert_eq!(count_rows(store, taxonomy.table()).await, 1);
    }
}
