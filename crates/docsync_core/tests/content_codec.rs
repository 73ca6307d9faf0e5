use docsync_core::content::codec::{deserialize, from_json_str, serialize, to_json_string};
use docsync_core::{
    ApplyMode, Delta, DocumentId, DocumentPatch, DocumentStore, EditingSurface, EventLoop,
    HeadlessSurface, MemoryDocumentStore, Op, SqliteDocumentStore, WriteMode,
};
use serde_json::{json, Map, Value};

fn bold() -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("bold".to_string(), json!(true));
    attributes
}

/// Content a user could produce: typed text, edits, formatting and an embed.
fn edited_content() -> Delta {
    let mut surface = HeadlessSurface::new();
    surface.type_text("Hello wörld");
    surface.delete_text(5, 1);
    surface.type_text_at(5, ", ");

    let mut content = surface.contents();
    content.push(Op::formatted(" bold", bold()));
    content.push(Op::embed("image", json!("cover.png")));
    content.push(Op::text("\n"));
    surface.set_contents(&content, ApplyMode::Silent);
    surface.contents()
}

#[test]
fn surface_content_survives_json_codec() {
    let content = edited_content();
    assert_eq!(content.plain_text(), "Hello, wörld bold\n");

    let stored = serialize(&content);
    assert_eq!(deserialize(Some(&stored)).unwrap(), content);
    assert_eq!(from_json_str(&to_json_string(&content)).unwrap(), content);
}

#[test]
fn surface_content_survives_both_stores() {
    let content = edited_content();
    let id = DocumentId::parse("roundtrip").unwrap();
    let mut patch = DocumentPatch::content(content.clone());
    patch.owner_id = Some("A".parse().unwrap());

    let memory = MemoryDocumentStore::new(EventLoop::new());
    memory.set(&id, patch.clone(), WriteMode::Replace).unwrap();
    assert_eq!(memory.get(&id).unwrap().unwrap().content, content);

    let sqlite = SqliteDocumentStore::open_in_memory(EventLoop::new()).unwrap();
    sqlite.set(&id, patch, WriteMode::Replace).unwrap();
    assert_eq!(sqlite.get(&id).unwrap().unwrap().content, content);
}

#[test]
fn stored_shape_matches_editor_wire_format() {
    let content = Delta::from_ops(vec![
        Op::text("Title"),
        Op::formatted("\n", {
            let mut header = Map::new();
            header.insert("header".to_string(), json!(1));
            header
        }),
    ]);
    assert_eq!(
        serialize(&content),
        json!([
            { "insert": "Title" },
            { "insert": "\n", "attributes": { "header": 1 } }
        ])
    );
}
