// Walks a few hops from a place node and builds a small joined table.
//
// Point it at a graph service with TESSERA__SERVICE__API_ROOT or a
// tessera.toml in the working directory.

use anyhow::Result;
use std::sync::Arc;
use tessera_common::config::AppConfig;
use tessera_core::{
    DatalogQuery, ExportFormat, Expansion, GraphService, HttpGraphService, JoinMode, Node,
    NodeSpec, QueryOptions, TableView, ValueQuery,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    println!("Graph service: {}", config.service.api_root);
    let service: Arc<dyn GraphService> = Arc::new(HttpGraphService::new(config.service));

    // Node cache
    let mut california = Node::resolve(service.as_ref(), NodeSpec::dcid("geoId/06")).await?;
    println!("{}", california);

    let counties = ValueQuery::incoming("containedInPlace").value_type("County").limit(5);
    for county in california.get_property_values(service.as_ref(), &counties).await? {
        println!("  {}", county.name().unwrap_or("<unnamed>"));
    }
    // Second read is served from the node's cache
    california.get_property_values(service.as_ref(), &counties).await?;
    let stats = california.cache().stats();
    println!("Cached {} values under {} keys\n", stats.values, stats.entries);

    // Query into a table, then expand and join
    let query = DatalogQuery::new()
        .select("?county")
        .select("?name")
        .constraint("?county", "typeOf", "County")
        .constraint("?county", "containedInPlace", "geoId/06")
        .constraint("?county", "name", "?name")
        .type_hint("?name", "Text");
    let options = QueryOptions::new()
        .rows(10)
        .label("?county", "County")
        .label("?name", "County Name");
    let mut counties = TableView::from_query(service.clone(), &query, options).await?;

    counties
        .expand(&Expansion::outgoing("containedInPlace", "County", "State").column_type("State"))
        .await?;

    let mut states = TableView::new(service.clone());
    states.add_column("State", "State", vec!["geoId/06".to_string()])?;
    states.add_column("Region", "Text", vec!["West".to_string()])?;
    counties.merge(&states, JoinMode::Left, "")?;

    print!("{}", counties.export(ExportFormat::Csv, None)?);

    let key = counties.save("california_counties").await?;
    println!("\nSaved as {}", key);

    Ok(())
}
