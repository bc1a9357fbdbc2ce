//! Read-only commands that print cache projections as JSON.

use serde::Serialize;

use keepcache::reader;

use crate::QueryCommand;

pub(crate) async fn handle_query(
    command: QueryCommand,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = keepcache::connect_and_migrate(database_url).await?;

    match command {
        QueryCommand::Status => print_json(&reader::sync_status(&db).await?)?,
        QueryCommand::Stats => print_json(&reader::stats(&db).await?)?,
        QueryCommand::Lists => print_json(&reader::all_lists(&db).await?)?,
        QueryCommand::Bookmarks { list: Some(list_id) } => {
            print_json(&reader::bookmarks_for_list(&db, &list_id).await?)?
        }
        QueryCommand::Bookmarks { list: None } => {
            print_json(&reader::all_bookmarks(&db).await?)?
        }
        QueryCommand::Search { query } => {
            print_json(&reader::search_bookmarks(&db, &query.join(" ")).await?)?
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
