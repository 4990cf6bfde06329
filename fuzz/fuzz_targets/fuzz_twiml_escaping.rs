#![no_main]

use libfuzzer_sys::fuzz_target;

use stenotype::voice::{GatherOptions, ResponseOptions, SayOptions, Verb};

fuzz_target!(|data: &str| {
    // Arbitrary text in bodies and attributes must never produce markup.
    let mut response = Verb::response(ResponseOptions::default());
    let gather = response
        .add_gather(GatherOptions {
            action: Some(data.to_string()),
            finish_on_key: Some(data.to_string()),
            ..Default::default()
        })
        .expect("Gather nests in Response");
    gather
        .add_say(data, SayOptions::default())
        .expect("Say nests in Gather");

    let rendered = response.to_string();
    assert_eq!(rendered, response.to_string());
    let tags = if data.is_empty() { 5 } else { 6 };
    assert_eq!(rendered.matches('<').count(), tags);
    assert_eq!(rendered.matches('"').count(), 4);
    let _ = response.to_url_encoded();
});
