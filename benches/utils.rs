use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

/// Profile contexts for `template.hbs`, seeded so every engine renders the
/// same data.
///
/// Field choices lean on the less common paths through a renderer: a `null`
/// nickname, zero discounts (truthy here, falsy in handlebars), empty tag
/// lists and scalar sequences read through `this`.
pub fn profile_contexts(count: usize) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| profile(&mut rng)).collect()
}

fn profile(rng: &mut StdRng) -> Value {
    let item_count = rng.random_range(3..10);
    let items: Vec<Value> = (0..item_count).map(|_| item(rng)).collect();
    let nickname = rng.random_bool(0.5).then(|| word(rng, 3, 6));

    json!({
        "user": {
            "name": word(rng, 5, 10),
            "nickname": nickname,
            "age": rng.random_range(18..80),
            "active": rng.random_bool(0.7),
        },
        "items": items,
        "show_details": rng.random_bool(0.8),
        "restricted": rng.random_bool(0.4),
    })
}

fn item(rng: &mut StdRng) -> Value {
    let tag_count = rng.random_range(0..4);
    let tags: Vec<String> = (0..tag_count).map(|_| word(rng, 2, 5)).collect();
    let discount = if rng.random_bool(0.5) { 0 } else { rng.random_range(5..50) };

    json!({
        "name": word(rng, 3, 8),
        "price": rng.random_range(10..1000),
        "discount": discount,
        "special": rng.random_bool(0.3),
        "tags": tags,
    })
}

fn word(rng: &mut StdRng, min_len: usize, max_len: usize) -> String {
    let len = rng.random_range(min_len..=max_len);
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}
