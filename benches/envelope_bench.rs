// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use krang_xwin::behaviour::{krang_rules, Bindings};
use krang_xwin::dom::parse_html;
use krang_xwin::rpc::{CallId, IncomingEnvelope, OperationType, OutgoingEnvelope, RequestOptions, ResponseTag};

fn request_benchmark(c: &mut Criterion) {
    let request = OutgoingEnvelope {
        operation: OperationType::Update,
        call_id: Some(CallId::from(42)),
        options: RequestOptions::new("https://cms.example.com")
            .app("story.pl")
            .form("edit")
            .param("rm", "save_and_jump")
            .param("jump_to", "/page[1]/para[2]"),
    };
    let encoded = request.encode().unwrap_or_default();

    c.bench_function("request_encode", |b| b.iter(|| black_box(request.encode())));
    c.bench_function("request_decode", |b| {
        b.iter(|| black_box(OutgoingEnvelope::decode(black_box(&encoded))))
    });
}

fn response_benchmark(c: &mut Criterion) {
    let mut response = IncomingEnvelope::new(ResponseTag::OnComplete)
        .with_payload(json!({
            "status": "ok",
            "msg": "Story 42 saved",
            "messages": ["Saved", "Checked in"],
        }))
        .with_call_id(Some(CallId::from(42)));
    response.prefs = json!({"message_timeout": 5});
    let encoded = response.encode();

    c.bench_function("response_encode", |b| b.iter(|| black_box(response.encode())));
    c.bench_function("response_decode", |b| {
        b.iter(|| black_box(IncomingEnvelope::decode(black_box(&encoded))))
    });
}

fn behaviour_benchmark(c: &mut Criterion) {
    let html = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <a href="/story.pl" class="new_window">Story</a>
            <form action="/workspace.pl" method="post">
                <input type="text" name="search_filter" class="autocomplete from_story">
            </form>
        </body>
        </html>
    "#;

    c.bench_function("apply_krang_rules", |b| {
        b.iter(|| {
            let Ok(document) = parse_html(html) else { return };
            let Ok(mut rules) = krang_rules() else { return };
            let mut bindings = Bindings::new();
            black_box(rules.apply(&document, &mut bindings));
        })
    });
}

criterion_group!(benches, request_benchmark, response_benchmark, behaviour_benchmark);
criterion_main!(benches);
