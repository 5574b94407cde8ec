use super::*;

fn poster(slug: &str) -> String {
    format!(
        r#"<li class="poster-container"><div class="really-lazy-load poster film-poster film-poster-1 linked-film-poster" data-film-slug="{slug}" data-target-link="/film/{slug}/"><img alt="{slug}"/></div></li>"#,
    )
}

fn watchlist_page(slugs: &[&str]) -> String {
    let posters: String = slugs.iter().map(|s| poster(s)).collect();
    format!(r#"<html><body class="list-page"><ul class="poster-list">{posters}</ul></body></html>"#)
}

#[test]
fn test_parse_watchlist_page_slugs_in_order() {
    let page = parse_watchlist_page(&watchlist_page(&["heat-1995", "ronin", "thief"])).unwrap();
    assert_eq!(page.poster_count, 3);
    assert_eq!(page.film_slugs, vec!["film/heat-1995/", "film/ronin/", "film/thief/"]);
    assert!(page.is_last(FULL_PAGE_SIZE));
}

#[test]
fn test_full_page_is_not_last() {
    let slugs: Vec<String> = (0..FULL_PAGE_SIZE).map(|i| format!("film-{}", i)).collect();
    let refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
    let page = parse_watchlist_page(&watchlist_page(&refs)).unwrap();
    assert_eq!(page.poster_count, 28);
    assert!(!page.is_last(FULL_PAGE_SIZE));
}

#[test]
fn test_poster_without_link_still_counts() {
    let html = r#"<html><body>
        <div class="really-lazy-load poster film-poster" data-target-link="/film/alien/"></div>
        <div class="really-lazy-load poster film-poster"></div>
        <div class="poster film-poster" data-target-link="/film/not-lazy/"></div>
    </body></html>"#;
    let page = parse_watchlist_page(html).unwrap();
    assert_eq!(page.poster_count, 2);
    assert_eq!(page.film_slugs, vec!["film/alien/"]);
}

#[test]
fn test_empty_watchlist_page() {
    let page = parse_watchlist_page("<html><body><p>No films yet</p></body></html>").unwrap();
    assert_eq!(page.poster_count, 0);
    assert!(page.film_slugs.is_empty());
}

#[test]
fn test_slug_from_target_link() {
    assert_eq!(slug_from_target_link("/film/heat-1995/"), Some("film/heat-1995/".to_string()));
    assert_eq!(slug_from_target_link("film/heat-1995/"), Some("film/heat-1995/".to_string()));
    assert_eq!(slug_from_target_link("/"), None);
    assert_eq!(slug_from_target_link(""), None);
}

#[test]
fn test_parse_film_tmdb_id() {
    let html = r#"<html><body class="film backdropped" data-tmdb-id="949" data-tmdb-type="movie"></body></html>"#;
    assert_eq!(parse_film_tmdb_id(html).unwrap(), Some("949".to_string()));
}

#[test]
fn test_film_page_without_id() {
    let empty = r#"<html><body class="film" data-tmdb-id=""></body></html>"#;
    assert_eq!(parse_film_tmdb_id(empty).unwrap(), None);

    let missing = r#"<html><body class="film"></body></html>"#;
    assert_eq!(parse_film_tmdb_id(missing).unwrap(), None);

    let not_a_film = r#"<html><body class="error" data-tmdb-id="1"></body></html>"#;
    assert_eq!(parse_film_tmdb_id(not_a_film).unwrap(), None);
}
