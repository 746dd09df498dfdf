
use variant_picker_dom::{
	config::ProductRef,
	dom::Dom,
	merge::{payload_text, undefer, FragmentMerger},
	morph::TreeMorph,
	selector::Selector,
	synthetic::SyntheticDom,
	Error,
};

const LIVE: &str = r#"<main><p id="intro">Hello</p><variant-picker data-product-id="1" data-product-url="/products/shirt"><input type="radio" name="color" data-option-value-id="red" checked><input type="radio" name="color" data-option-value-id="blue"></variant-picker><aside>unrelated</aside></main>"#;

fn setup() -> (SyntheticDom, <SyntheticDom as Dom>::Node) {
	fakes_::init_tracing();
	let dom = SyntheticDom::new(LIVE);
	let picker = dom.query(&dom.document(), &Selector::tag("variant-picker")).unwrap();
	(dom, picker)
}

#[test]
fn scoped_merge_keeps_live_nodes() {
	let (dom, picker) = setup();
	let aside = dom.query(&dom.document(), &Selector::tag("aside")).unwrap();
	let red = dom.query(&picker, &Selector::tag("input")).unwrap();
	let fetched = dom
		.parse_document(r#"<variant-picker data-product-id="1" data-product-url="/products/shirt"><input type="radio" name="color" data-option-value-id="red"><input type="radio" name="color" data-option-value-id="blue" checked></variant-picker>"#)
		.unwrap();

	let morph = TreeMorph::default();
	let new_product = FragmentMerger::new(&dom, &morph).merge_scoped(&picker, &fetched).unwrap();

	assert_eq!(new_product, None);
	assert_eq!(dom.query(&picker, &Selector::tag("input")), Some(red.clone()));
	assert!(!dom.checked(&red));
	assert_eq!(dom.query(&picker, &Selector::tag("input").checked()).and_then(|input| dom.attribute(&input, "data-option-value-id")).as_deref(), Some("blue"));
	assert_eq!(dom.text_content(&aside), "unrelated");
}

#[test]
fn scoped_merge_reports_new_products() {
	let (dom, picker) = setup();
	let fetched = dom.parse_document(r#"<variant-picker data-product-id="2" data-product-url="/products/pants"></variant-picker>"#).unwrap();

	let morph = TreeMorph::default();
	let new_product = FragmentMerger::new(&dom, &morph).merge_scoped(&picker, &fetched).unwrap();

	assert_eq!(
		new_product,
		Some(ProductRef {
			id: "2".to_owned(),
			url: "/products/pants".to_owned(),
		})
	);
	assert_eq!(dom.attribute(&picker, "data-product-id").as_deref(), Some("2"));
	assert!(dom.children(&picker).is_empty());
}

#[test]
fn scoped_merge_needs_a_source() {
	let (dom, picker) = setup();
	let fetched = dom.parse_document("<main></main>").unwrap();

	let morph = TreeMorph::default();
	match FragmentMerger::new(&dom, &morph).merge_scoped(&picker, &fetched) {
		Err(Error::MissingPickerSource(tag)) => assert_eq!(tag, "variant-picker"),
		other => panic!("Expected a missing source but got {:?}", other),
	}
	assert_eq!(dom.attribute(&picker, "data-product-id").as_deref(), Some("1"));
}

#[test]
fn main_merge_replaces_the_region() {
	let (dom, _) = setup();
	let intro = dom.query(&dom.document(), &Selector::tag("p")).unwrap();
	let fetched = dom.parse_document(r#"<main><p id="intro">Bye</p></main>"#).unwrap();

	let morph = TreeMorph::default();
	let main = FragmentMerger::new(&dom, &morph).merge_main(&fetched).unwrap();

	assert_eq!(dom.inner_html(&main), r#"<p id="intro">Bye</p>"#);
	assert_eq!(dom.query(&main, &Selector::tag("p")), Some(intro));

	let empty = dom.parse_document("<div></div>").unwrap();
	assert!(matches!(FragmentMerger::new(&dom, &morph).merge_main(&empty), Err(Error::MissingMain)));
}

#[test]
fn payloads_must_have_content() {
	let dom = SyntheticDom::new("");
	let full = dom.parse_document(r#"<variant-picker><script type="application/json">{"id":1}</script></variant-picker>"#).unwrap();
	let blank = dom.parse_document(r#"<variant-picker><script type="application/json">  </script></variant-picker>"#).unwrap();
	let elsewhere = dom.parse_document(r#"<div><script type="application/json">{"id":1}</script></div>"#).unwrap();

	assert_eq!(payload_text(&dom, &full, "variant-picker").as_deref(), Some(r#"{"id":1}"#));
	assert_eq!(payload_text(&dom, &blank, "variant-picker"), None);
	assert_eq!(payload_text(&dom, &elsewhere, "variant-picker"), None);
}

#[test]
fn deferred_overflow_lists_are_released() {
	let dom = SyntheticDom::new("");
	let fetched = dom.parse_document(r#"<overflow-list defer class="swatches"></overflow-list>"#).unwrap();
	undefer(&dom, &fetched);

	let list = dom.query(&fetched, &Selector::tag("overflow-list")).unwrap();
	assert_eq!(dom.attribute(&list, "defer"), None);
	assert_eq!(dom.attribute(&list, "class").as_deref(), Some("swatches"));
}
