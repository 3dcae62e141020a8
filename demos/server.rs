use async_std::{io, task};
use raw_h1::server::{Connection, ResponseWriter};
use raw_h1::{Headers, Request, Server, StatusCode};

const PORT: u16 = 42069;

fn html(title: &str, heading: &str, message: &str) -> String {
    format!(
        "<html>\n  <head>\n    <title>{}</title>\n  </head>\n  <body>\n    <h1>{}</h1>\n    <p>{}</p>\n  </body>\n</html>\n",
        title, heading, message
    )
}

async fn handle(mut res: ResponseWriter<Connection>, req: Request) -> raw_h1::Result<()> {
    if req.target() == "/chunked" {
        return stream(res).await;
    }

    let (status, page) = match req.target() {
        "/yourproblem" => (
            StatusCode::BAD_REQUEST,
            html("400 Bad Request", "Bad Request", "The request could not be served."),
        ),
        "/myproblem" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            html(
                "500 Internal Server Error",
                "Internal Server Error",
                "Something went wrong on our side.",
            ),
        ),
        _ => (StatusCode::OK, html("200 OK", "Success!", "Your request was served.")),
    };

    let mut headers = Headers::new();
    headers.replace("Content-Length", page.len().to_string());
    headers.replace("Connection", "close");
    headers.replace("Content-Type", "text/html");

    res.write_status_line(status).await?;
    res.write_headers(&headers).await?;
    res.write_body(page.as_bytes()).await?;
    Ok(())
}

/// Stream a body in chunks and report its length in a trailer.
async fn stream(mut res: ResponseWriter<Connection>) -> raw_h1::Result<()> {
    let mut headers = Headers::new();
    headers.replace("Transfer-Encoding", "chunked");
    headers.replace("Connection", "close");
    headers.replace("Content-Type", "text/plain");
    headers.replace("Trailer", "X-Content-Length");

    res.write_status_line(StatusCode::OK).await?;
    res.write_headers(&headers).await?;

    let mut len = 0;
    for n in 1..=10 {
        let line = format!("line {}\n", n);
        len += res.write_chunk(line.as_bytes()).await?;
    }
    res.write_chunks_done().await?;

    let mut trailers = Headers::new();
    trailers.replace("X-Content-Length", len.to_string());
    res.write_trailers(&trailers).await?;
    Ok(())
}

fn main() -> io::Result<()> {
    task::block_on(async {
        let server = Server::start(PORT, handle)?;
        println!("listening on {}", server.local_addr());
        println!("press enter to stop");

        let mut line = String::new();
        io::stdin().read_line(&mut line).await?;

        server.stop().await;
        println!("server stopped");
        Ok(())
    })
}
