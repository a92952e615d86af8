// Effect vocabulary and registry contents

use avatar_fx::effects::composite::{pro_enhance_stages, Stage};
use avatar_fx::effects::{EffectId, Kernel, Registry, SimpleFilter, TransformSpec};
use rstest::rstest;

#[test]
fn test_every_effect_is_registered_exactly_once() {
    let registry = Registry::global();
    assert_eq!(registry.len(), 21);
    let mut ids = registry.ids();
    ids.dedup();
    assert_eq!(ids.len(), 21);
}

#[rstest]
#[case(EffectId::Blur, Kernel::BLUR)]
#[case(EffectId::Contour, Kernel::CONTOUR)]
#[case(EffectId::Detail, Kernel::DETAIL)]
#[case(EffectId::EdgeEnhance, Kernel::EDGE_ENHANCE)]
#[case(EffectId::EdgeEnhanceMore, Kernel::EDGE_ENHANCE_MORE)]
#[case(EffectId::Emboss, Kernel::EMBOSS)]
#[case(EffectId::FindEdges, Kernel::FIND_EDGES)]
#[case(EffectId::Sharpen, Kernel::SHARPEN)]
#[case(EffectId::Smooth, Kernel::SMOOTH)]
#[case(EffectId::SmoothMore, Kernel::SMOOTH_MORE)]
fn test_kernel_effects(#[case] effect: EffectId, #[case] kernel: Kernel) {
    assert_eq!(
        Registry::global().get(effect),
        Some(&TransformSpec::SimpleFilter(SimpleFilter::Convolve(kernel)))
    );
}

#[test]
fn test_pro_enhance_stage_order() {
    let names: Vec<&str> = pro_enhance_stages().iter().map(Stage::name).collect();
    assert_eq!(
        names,
        [
            "resize",
            "auto_contrast",
            "unsharp_mask",
            "enhance",
            "enhance",
            "enhance",
            "convolve",
            "vignette"
        ]
    );
    assert_eq!(
        Registry::global().get(EffectId::ProEnhance),
        Some(&TransformSpec::Composite(pro_enhance_stages()))
    );
}

#[rstest]
#[case("none", EffectId::None, "None", "avatar_none.png")]
#[case("edge_enhance_more", EffectId::EdgeEnhanceMore, "Edge Enhance More", "avatar_edge_enhance_more.png")]
#[case("pro_enhance", EffectId::ProEnhance, "Pro Enhance", "avatar_pro_enhance.png")]
#[case("LOW_CONTRAST", EffectId::LowContrast, "Low Contrast", "avatar_low_contrast.png")]
fn test_names(
    #[case] input: &str,
    #[case] effect: EffectId,
    #[case] display: &str,
    #[case] file: &str,
) {
    let parsed: EffectId = input.parse().unwrap();
    assert_eq!(parsed, effect);
    assert_eq!(parsed.display_name(), display);
    assert_eq!(parsed.file_name(), file);
}

#[rstest]
#[case("sparkle")]
#[case("edge-enhance")]
#[case("pro enhance")]
fn test_unknown_names(#[case] input: &str) {
    let err = input.parse::<EffectId>().unwrap_err();
    assert_eq!(err.name, input);
}
