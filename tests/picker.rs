
use fakes_::{Harness, ProductPage};
use variant_picker_dom::{
	dom::Dom,
	events::VariantSelected,
	request::RequestSource,
	selector::Selector,
	Error,
};

const HREF: &str = "https://shop.test/products/shirt?variant=11";

fn harness(page: &ProductPage) -> Harness {
	Harness::new(&page.render(), "product", HREF)
}

#[test]
fn selection_is_announced_before_the_request() {
	let h = harness(&ProductPage::default());
	h.pick("blue").unwrap();

	assert_eq!(*h.events.selected.borrow(), vec![VariantSelected { option_value_id: "blue".to_owned() }]);
	assert_eq!(h.fetch.urls(), vec!["/products/shirt?option_values=blue".to_owned()]);
	assert!(h.picker.has_pending_request());
	assert!(h.events.updates.borrow().is_empty());
}

#[test]
fn scoped_response_is_merged_and_announced() {
	let mut h = harness(&ProductPage::default());
	let blue = h.option("blue");
	h.pick("blue").unwrap();
	h.fetch.respond(
		0,
		&ProductPage {
			promotion: Some("Blue week"),
			..ProductPage::default()
		}
		.checked("blue")
		.render(),
	);
	h.settle();

	assert!(!h.picker.has_pending_request());
	assert_eq!(h.option("blue"), blue);
	assert!(h.dom.checked(&blue));
	assert!(!h.dom.checked(&h.option("red")));

	let updates = h.events.updates.borrow();
	assert_eq!(updates.len(), 1);
	assert_eq!(updates[0].source_id, "blue");
	assert_eq!(updates[0].product_id, "1");
	assert_eq!(updates[0].new_product, None);
	assert_eq!(updates[0].resource["id"], "12");

	let payload = h.find(&Selector::tag("script").within(Selector::tag("variant-picker")));
	assert!(h.dom.text_content(&payload).contains("variant=12"));

	assert_eq!(*h.location.replaced.borrow(), vec!["https://shop.test/products/shirt?variant=12".to_owned()]);

	let promotion = h.find(&Selector::class("product-promotion-callout"));
	assert_eq!(h.dom.text_content(&promotion), "Blue week");
	assert!(!h.dom.hidden(&promotion));
}

#[test]
fn promotion_is_hidden_when_the_response_has_none() {
	let mut h = harness(&ProductPage::default());
	h.pick("blue").unwrap();
	h.fetch.respond(0, &ProductPage { promotion: None, ..ProductPage::default() }.checked("blue").render());
	h.settle();

	let promotion = h.find(&Selector::class("product-promotion-callout"));
	assert!(h.dom.hidden(&promotion));
	assert_eq!(h.dom.text_content(&promotion), "Spring sale");
}

#[test]
fn superseded_requests_are_cancelled() {
	let mut h = harness(&ProductPage::default());
	h.pick("blue").unwrap();
	h.settle();
	h.pick("green").unwrap();
	h.settle();

	assert!(h.fetch.was_cancelled(0));
	assert!(!h.fetch.was_cancelled(1));
	assert!(h.picker.has_pending_request());
}

#[test]
fn only_the_last_response_is_applied() {
	let mut h = harness(&ProductPage::default());
	h.pick("blue").unwrap();
	h.pick("green").unwrap();

	// The older response arrives first.
	h.fetch.respond(0, &ProductPage::default().checked("blue").render());
	h.settle();
	assert!(h.events.updates.borrow().is_empty());
	assert!(h.location.replaced.borrow().is_empty());

	h.fetch.respond(1, &ProductPage::default().checked("green").render());
	h.settle();

	let updates = h.events.updates.borrow();
	assert_eq!(updates.len(), 1);
	assert_eq!(updates[0].source_id, "green");
	assert_eq!(*h.location.replaced.borrow(), vec!["https://shop.test/products/shirt?variant=13".to_owned()]);
}

#[test]
fn repeating_a_selection_is_stable() {
	let page = ProductPage { limit: Some("2"), ..ProductPage::default() };
	let response = ProductPage { limit: Some("2"), ..ProductPage::default() }.checked("blue").render();
	let mut h = harness(&page);

	h.pick("blue").unwrap();
	h.fetch.respond(0, &response);
	h.settle();
	let first = h.picker_html();

	h.pick("blue").unwrap();
	h.fetch.respond(1, &response);
	h.settle();

	let urls = h.fetch.urls();
	assert_eq!(urls[0], urls[1]);
	assert_eq!(h.picker_html(), first);
	assert_eq!(h.dom.query_all(h.picker.element(), &Selector::class("variant-option__button-label--more")).len(), 1);
}

#[test]
fn responses_without_payload_change_nothing() {
	let mut h = harness(&ProductPage::default());
	h.pick("blue").unwrap();
	let before = h.dom.outer_html(&h.dom.document());

	h.fetch.respond(
		0,
		&ProductPage {
			payload: false,
			promotion: None,
			..ProductPage::default()
		}
		.checked("blue")
		.render(),
	);
	h.settle();

	assert_eq!(h.dom.outer_html(&h.dom.document()), before);
	assert!(h.events.updates.borrow().is_empty());
	assert!(h.location.replaced.borrow().is_empty());
}

#[test]
fn failed_requests_are_released() {
	let mut h = harness(&ProductPage::default());
	h.pick("blue").unwrap();
	h.fetch.fail(0, "offline");
	h.settle();

	assert!(!h.picker.has_pending_request());
	assert!(h.events.updates.borrow().is_empty());
	assert!(h.location.replaced.borrow().is_empty());
}

#[test]
fn missing_option_value_ids_abort_the_change() {
	let markup = r#"<main><variant-picker data-product-url="/products/shirt">
		<fieldset><legend>Size</legend><input type="radio" name="size" checked></fieldset>
		<fieldset><legend>Color</legend><input type="radio" name="color" data-option-value-id="blue"></fieldset>
	</variant-picker></main>"#;
	let h = Harness::new(markup, "product", HREF);

	match h.pick("blue") {
		Err(Error::MissingOptionValueId) => (),
		other => panic!("Expected a missing option value ID but got {:?}", other),
	}
	assert_eq!(h.events.selected.borrow().len(), 1);
	assert!(h.fetch.urls().is_empty());
	assert!(!h.picker.has_pending_request());
}

#[test]
fn selects_move_their_selected_option() {
	let markup = r#"<main><variant-picker data-product-url="/products/shirt">
		<select name="size">
			<option value="s" data-option-value-id="small" data-variant-id="21" selected>S</option>
			<option value="m" data-option-value-id="medium" data-variant-id="22">M</option>
		</select>
	</variant-picker></main>"#;
	let h = Harness::new(markup, "product", HREF);
	let select = h.find(&Selector::tag("select"));
	h.dom.set_value(&select, "m");
	h.picker.variant_changed(&select).unwrap();

	assert_eq!(h.dom.attribute(&h.option("small"), "selected"), None);
	assert!(h.dom.attribute(&h.option("medium"), "selected").is_some());
	assert_eq!(h.events.selected.borrow()[0].option_value_id, "medium");
	assert_eq!(h.fetch.urls(), vec!["/products/shirt?option_values=medium".to_owned()]);
}

#[test]
fn options_can_be_selected_by_id() {
	let h = harness(&ProductPage::default());
	let green = h.picker.update_selected_option("green").unwrap();

	assert_eq!(green, h.option("green"));
	assert!(h.dom.checked(&green));
	assert_eq!(h.picker.selection().selected_option_ids().unwrap(), vec!["green".to_owned()]);
	assert!(h.fetch.urls().is_empty());

	match h.picker.update_selected_option("purple") {
		Err(Error::TargetNotFound(id)) => assert_eq!(id, "purple"),
		other => panic!("Expected a missing target but got {:?}", other),
	}
}

#[test]
fn product_cards_narrow_the_request() {
	let h = harness(&ProductPage::default());
	let card = vec!["blue".to_owned(), "large".to_owned()];
	let request = h.picker.build_request_url(&h.option("blue"), RequestSource::ProductCard { selected_option_ids: &card }).unwrap();

	assert_eq!(request.url, "/products/shirt?option_values=blue,large");
	assert_eq!(request.base, "/products/shirt");
}

#[test]
fn rejected_address_bar_updates_still_announce() {
	let mut h = harness(&ProductPage::default());
	h.location.rejects.set(true);
	h.pick("blue").unwrap();
	h.fetch.respond(0, &ProductPage::default().checked("blue").render());
	h.settle();

	assert!(h.dom.checked(&h.option("blue")));
	assert!(h.location.replaced.borrow().is_empty());
	let updates = h.events.updates.borrow();
	assert_eq!(updates.len(), 1);
	assert_eq!(updates[0].source_id, "blue");
	assert_eq!(updates[0].resource["id"], "12");
}

#[test]
fn open_quick_add_modals_own_the_promotion() {
	let markup = format!(
		r#"<main><product-form class="product-form"><div class="product-promotion-callout">Spring sale</div><dialog class="quick-add-modal" open><div class="product-promotion-callout">Modal sale</div>{}</dialog></product-form></main>"#,
		ProductPage::default().picker()
	);
	let mut h = Harness::new(&markup, "product", HREF);
	h.pick("blue").unwrap();
	h.fetch.respond(0, &ProductPage { promotion: Some("Blue week"), ..ProductPage::default() }.checked("blue").render());
	h.settle();

	let callouts = h.dom.query_all(&h.dom.document(), &Selector::class("product-promotion-callout"));
	assert_eq!(callouts.len(), 2);
	assert_eq!(h.dom.text_content(&callouts[0]), "Spring sale");
	assert_eq!(h.dom.text_content(&callouts[1]), "Blue week");
	assert!(!h.dom.hidden(&callouts[1]));
}

#[test]
fn quick_add_pickers_request_the_card_section() {
	let page = ProductPage {
		container: "quick-add-component",
		product_url: "/products/shirt?view=quick",
		..ProductPage::default()
	};
	let h = harness(&page);
	h.pick("blue").unwrap();

	assert_eq!(h.fetch.urls(), vec!["/products/shirt?section_id=section-rendering-product-card&option_values=blue".to_owned()]);
}
