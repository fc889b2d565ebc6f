use proptest::prelude::*;
use pushlink::environment::{
    canonical_subscription_urls, classify, AmbientContext, AppConfig, BuildMode, WindowRole,
};
use url::Url;

fn build_mode() -> impl Strategy<Value = BuildMode> {
    prop_oneof![
        Just(BuildMode::Development),
        Just(BuildMode::Staging),
        Just(BuildMode::Production),
    ]
}

proptest! {
    #[test]
    fn classification_is_deterministic(
        host in "[a-z]{1,10}\\.(example|onesignal\\.com|os\\.tc)",
        path in "(/[a-zA-Z]{0,8}){0,3}",
        top in any::<bool>(),
        build in build_mode(),
    ) {
        let url = Url::parse(&format!("https://{}{}", host, path)).unwrap();
        let ambient = if top {
            AmbientContext::top_window(url)
        } else {
            AmbientContext::nested_frame(url)
        }
        .with_build(build);
        prop_assert_eq!(classify(&ambient), classify(&ambient.clone()));
    }

    #[test]
    fn foreign_top_windows_are_hosts(
        host in "[a-z]{1,10}\\.example",
        path in "(/[a-zA-Z]{0,8}){0,3}",
        build in build_mode(),
    ) {
        let url = Url::parse(&format!("https://{}{}", host, path)).unwrap();
        let ambient = AmbientContext::top_window(url).with_build(build);
        prop_assert_eq!(classify(&ambient), WindowRole::Host);
    }

    #[test]
    fn nested_frames_are_never_top_level_roles(
        host in "[a-z]{1,10}\\.(example|onesignal\\.com)",
        path in "(/[a-zA-Z]{0,12}){0,2}",
    ) {
        let url = Url::parse(&format!("https://{}{}", host, path)).unwrap();
        let role = classify(&AmbientContext::nested_frame(url).with_build(BuildMode::Production));
        prop_assert!(matches!(role, WindowRole::ProxyFrame | WindowRole::CustomIframe));
    }

    #[test]
    fn legacy_origin_always_comes_first(
        subdomain in "[a-z][a-z0-9]{0,15}",
        legacy in any::<bool>(),
        build in build_mode(),
    ) {
        let config = AppConfig {
            app_id: None,
            subdomain: Some(subdomain.clone()),
            use_legacy_domain: legacy,
        };
        let urls = canonical_subscription_urls(&config, build).unwrap();
        prop_assert_eq!(urls.len(), if legacy { 1 } else { 2 });
        prop_assert!(urls[0].host_str().unwrap().starts_with(&subdomain));
        prop_assert!(!urls[0].host_str().unwrap().contains("os.tc"));
    }
}

#[test]
fn popup_only_on_service_domain_subscribe_page() {
    let at = |url: &str| {
        classify(
            &AmbientContext::top_window(Url::parse(url).unwrap()).with_build(BuildMode::Production),
        )
    };
    assert_eq!(at("https://shop.onesignal.com/subscribe"), WindowRole::SubscriptionPopup);
    assert_eq!(at("https://shop.onesignal.com/subscribe?x=1"), WindowRole::Host);
    assert_eq!(at("https://shop.example/subscribe"), WindowRole::Host);
    assert_eq!(at("https://shop.example/?initOneSignal"), WindowRole::SubscriptionPopup);
}

#[test]
fn windowless_scopes() {
    assert_eq!(classify(&AmbientContext::windowless(true)), WindowRole::ServiceWorker);
    assert_eq!(classify(&AmbientContext::windowless(false)), WindowRole::Unknown);
}
