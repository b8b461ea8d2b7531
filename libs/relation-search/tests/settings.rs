//! Settings files drive the same searches as hand-built declarations.

#[allow(unused)]
mod support;

use relation_search::{
    search_fn, CustomSearches, Predicate, SearchContext, SearchSettings, SelectQuery,
};
use std::path::PathBuf;
use support::*;

const SETTINGS: &str = r#"
[resources.posts]
model = "Post"
search = ["title"]
term_delimiter = "|"

[[resources.posts.relations]]
relation = "author"
columns = ["name"]

[[resources.posts.relations]]
relation = "comments"
relations = [{ relation = "author", columns = ["name"] }]

[[resources.posts.global_relations]]
relation = "tags"
columns = ["name"]

[resources.comments]
model = "Comment"
search = ["body"]

[[resources.comments.relations]]
relation = "commentable"
morph = { columns = ["title"] }

[[resources.comments.relations]]
relation = "author"
custom = "author_domain"
"#;

fn write_settings(name: &str) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!(
        "relation-search-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, SETTINGS)?;
    Ok(path)
}

fn customs() -> CustomSearches {
    // Match users by the domain of their email address.
    CustomSearches::new().register(
        "author_domain",
        search_fn(|scope, relation, term| {
            scope.relation_exists(relation, |author| {
                let dialect = author.dialect();
                let email = format!(
                    "{}.{}",
                    dialect.quote_identifier(author.alias()),
                    dialect.quote_identifier("email")
                );
                Ok(Predicate::raw(
                    format!("substr({0}, instr({0}, '@') + 1) = ?", email),
                    vec![term.into()],
                ))
            })
        }),
    )
}

async fn ids(
    db: &TestDb,
    settings: &SearchSettings,
    resource: &str,
    term: &str,
    context: SearchContext,
) -> anyhow::Result<Vec<i64>> {
    let registry = settings.compile(db.engine.schema(), &customs())?;
    let resource = registry
        .get(resource)
        .ok_or_else(|| anyhow::anyhow!("resource {} not compiled", resource))?;
    let mut query = SelectQuery::new(resource.name());
    db.engine
        .apply_search(resource, &mut query, term, context)
        .await?;
    db.fetch_ids(&query).await
}

#[tokio::test]
async fn settings_file_drives_search() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let path = write_settings("drives")?;
    let settings = SearchSettings::load(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(
        ids(&db, &settings, "posts", "carol", SearchContext::Scoped).await?,
        vec![3, 4]
    );
    assert_eq!(
        ids(&db, &settings, "posts", "rust|jones", SearchContext::Scoped).await?,
        vec![1, 2, 4]
    );
    // Global search swaps in the tag relation.
    assert_eq!(
        ids(&db, &settings, "posts", "kitchen", SearchContext::Global).await?,
        vec![2]
    );
    assert!(ids(&db, &settings, "posts", "carol", SearchContext::Global)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn custom_search_from_settings() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let settings = SearchSettings::from_toml_str(SETTINGS)?;

    assert_eq!(
        ids(&db, &settings, "comments", "example.com", SearchContext::Scoped).await?,
        vec![1, 3, 4]
    );
    assert_eq!(
        ids(&db, &settings, "comments", "sample.org", SearchContext::Scoped).await?,
        vec![2]
    );
    assert_eq!(
        ids(&db, &settings, "comments", "talk", SearchContext::Scoped).await?,
        vec![3]
    );
    Ok(())
}

#[tokio::test]
async fn environment_overrides_file_values() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let path = write_settings("env")?;
    std::env::set_var(
        "RELATION_SEARCH__RESOURCES__COMMENTS__SEARCH_RELATIONS_GLOBALLY",
        "false",
    );
    let settings = SearchSettings::load(&path);
    std::env::remove_var("RELATION_SEARCH__RESOURCES__COMMENTS__SEARCH_RELATIONS_GLOBALLY");
    std::fs::remove_file(&path)?;
    let settings = settings?;

    assert!(!settings.resources["comments"].search_relations_globally);
    assert!(settings.resources["posts"].search_relations_globally);
    assert_eq!(
        ids(&db, &settings, "comments", "conference", SearchContext::Scoped).await?,
        vec![3]
    );
    // Only the comment body is searched globally.
    assert!(ids(&db, &settings, "comments", "conference", SearchContext::Global)
        .await?
        .is_empty());
    Ok(())
}
