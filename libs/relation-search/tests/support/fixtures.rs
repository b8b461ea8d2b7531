use relation_search::{ModelDef, Schema};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL
);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users (id)
);
CREATE TABLE tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE post_tag (
    post_id INTEGER NOT NULL REFERENCES posts (id),
    tag_id INTEGER NOT NULL REFERENCES tags (id)
);
CREATE TABLE videos (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL
);
CREATE TABLE comments (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users (id),
    body TEXT NOT NULL,
    commentable_type TEXT,
    commentable_id INTEGER
);
"#;

pub const FIXTURE_SQL: &str = r#"
INSERT INTO users (id, name, email) VALUES
    (1, 'Alice Smith', 'alice@example.com'),
    (2, 'Bob Jones', 'bob@example.com'),
    (3, 'Carol White', 'carol@sample.org');

INSERT INTO posts (id, title, status, user_id) VALUES
    (1, 'Rust tips', 'published', 1),
    (2, 'Cooking at home', 'published', 2),
    (3, 'Gardening', 'draft', 3),
    (4, 'Travel notes', 'published', 2);

INSERT INTO tags (id, name) VALUES
    (1, 'systems'),
    (2, 'kitchen');

INSERT INTO post_tag (post_id, tag_id) VALUES
    (1, 1),
    (2, 2);

INSERT INTO videos (id, title) VALUES
    (1, 'Rust conference talk'),
    (2, 'Pasta 100% fresh');

INSERT INTO comments (id, user_id, body, commentable_type, commentable_id) VALUES
    (1, 1, 'Nice garden', 'Post', 3),
    (2, 3, 'Great trip', 'Post', 4),
    (3, 2, 'Loved the talk', 'video', 1),
    (4, 1, 'Agreed', 'Comment', 3);
"#;

/// Users write posts; posts and videos collect polymorphic comments.
pub fn blog_schema() -> Schema {
    Schema::new()
        .with_model(ModelDef::new("User", "users").has_many("posts", "Post", "user_id"))
        .with_model(
            ModelDef::new("Post", "posts")
                .belongs_to("author", "User", "user_id")
                .belongs_to_many("tags", "Tag", "post_tag", "post_id", "tag_id")
                .morph_many("comments", "Comment", "commentable"),
        )
        .with_model(ModelDef::new("Tag", "tags"))
        .with_model(
            ModelDef::new("Video", "videos")
                .with_morph_class("video")
                .morph_many("comments", "Comment", "commentable"),
        )
        .with_model(
            ModelDef::new("Comment", "comments")
                .belongs_to("author", "User", "user_id")
                .morph_to("commentable", "commentable")
                .morph_many("replies", "Comment", "commentable"),
        )
}
