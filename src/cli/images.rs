//! CLI handlers for images, comments and likes.

use crate::api::{Comment, Image, ImagePage, Upload};
use crate::session::Session;

use super::{record_id, CommentsCommands, ImagesCommands};

pub async fn handle_images(
    session: &Session,
    command: ImagesCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let images = session.images();
    match command {
        ImagesCommands::List(p) => print_page(&images.list(p.page, p.limit).await?),
        ImagesCommands::Mine(p) => print_page(&images.mine(p.page, p.limit).await?),
        ImagesCommands::Search { query, page } => {
            print_page(&images.search(&query, page.page, page.limit).await?)
        }
        ImagesCommands::Get { id } => {
            let image = images.get(&record_id(&id)).await?;
            print_image(&image);
            if let Some(url) = &image.url {
                println!("    {url}");
            }
        }
        ImagesCommands::Upload { path, description } => {
            let upload = Upload::from_path(&path, description).await?;
            let image = images.upload(upload).await?;
            println!("✅ Uploaded as {}", image.id);
        }
        ImagesCommands::Delete { id } => {
            images.delete(&record_id(&id)).await?;
            println!("✅ Deleted {id}");
        }
    }
    Ok(())
}

pub async fn handle_comments(
    session: &Session,
    image: &str,
    command: Option<CommentsCommands>,
) -> Result<(), Box<dyn std::error::Error>> {
    let comments = session.comments();
    let image = record_id(image);
    match command.unwrap_or(CommentsCommands::List) {
        CommentsCommands::List => {
            let list = comments.list(&image).await?;
            if list.is_empty() {
                println!("No comments yet.");
            }
            for comment in &list {
                print_comment(comment);
            }
        }
        CommentsCommands::Add { text } => print_comment(&comments.create(&image, &text).await?),
        CommentsCommands::Edit { comment, text } => {
            print_comment(&comments.update(&image, &record_id(&comment), &text).await?)
        }
        CommentsCommands::Delete { comment } => {
            comments.delete(&image, &record_id(&comment)).await?;
            println!("✅ Deleted comment {comment}");
        }
    }
    Ok(())
}

pub async fn handle_like(session: &Session, image: &str) -> Result<(), Box<dyn std::error::Error>> {
    let state = session.likes().toggle(&record_id(image)).await?;
    let verb = if state.liked { "❤️  Liked" } else { "Unliked" };
    println!("{verb} ({} likes)", state.likes);
    Ok(())
}

fn print_page(page: &ImagePage) {
    for image in &page.images {
        print_image(image);
    }
    println!(
        "\nPage {} of {} ({} images)",
        page.current_page, page.total_pages, page.total
    );
}

fn print_image(image: &Image) {
    let owner = image
        .user
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");
    let title = image
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(image.filename.as_deref())
        .unwrap_or("(untitled)");
    println!(
        "  [{}] {title} by {owner} · {} likes",
        image.id,
        image.likes.unwrap_or(0)
    );
}

fn print_comment(comment: &Comment) {
    let author = comment
        .user
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");
    println!("  [{}] {author}: {}", comment.id, comment.text);
}
