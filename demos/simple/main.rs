use linkflow::{
    ActionType, ChannelEvent, ChannelOptions, Component, ComponentHandle, ComponentKind, EngineBuilder, Linkage, ParameterMapping, Vars, resolver_from_handles,
};
use serde_json::{Value, json};

fn main() {
    let engine = EngineBuilder::new().env("API_BASE", "http://localhost:8080").build().unwrap();

    engine.launch();

    // Components are owned by the host; the engine only sees them through a resolver.
    let form = ComponentHandle::new(Component::new("filter-form", ComponentKind::Form));

    let mut config = Vars::new();
    config.set("title", "Sales by city");
    let chart = ComponentHandle::new(Component::new("sales-chart", ComponentKind::Chart).with_config(config));

    let resolver = resolver_from_handles([form.clone(), chart.clone()]);

    // Submitting the filter form refreshes the chart with mapped parameters.
    engine
        .registry()
        .add(Linkage::new("filter-form", "sales-chart", "form.submit", ActionType::Refresh).with_mappings(vec![
            ParameterMapping::rename("formData.city", "city"),
            ParameterMapping::fixed("pageSize", json!(20)),
        ]))
        .unwrap();

    ChannelEvent::channel(engine.channel(), ChannelOptions::with_cid("sales-chart".to_string())).on_refresh(|e| {
        println!("refresh {} with params: {}", e.component_id, Value::from(e.params.clone()));
    });

    engine.trigger_blocking(
        "filter-form",
        "form.submit",
        json!({}),
        json!({"formData": {"city": "Seattle"}}),
        &resolver,
    );

    for record in engine.logs().records() {
        println!("linkage {} -> success: {}", record.linkage_id, record.success);
    }
    println!("chart params: {}", Value::from(chart.snapshot().linkage_params));

    // give the channel fan-out a moment before shutting down
    std::thread::sleep(std::time::Duration::from_millis(200));
    engine.shutdown();
}
