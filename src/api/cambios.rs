use actix_web::{web, HttpResponse};
use futures_util::stream;
use tokio::sync::broadcast;

use super::AppState;
use crate::actors::Cambio;

// ============================================================================
// Change Feed Endpoint - Server-Sent Events
// ============================================================================
//
// Each subscriber gets its own broadcast receiver. A lagged receiver skips
// the dropped events and keeps going; clients treat every event as "reload
// the named table", so skipping is safe.
//
// ============================================================================

pub async fn suscribir(state: web::Data<AppState>) -> HttpResponse {
    let rx = state.cambios.subscribe();

    let eventos = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(cambio) => match codificar(&cambio) {
                    Some(frame) => return Some((Ok::<_, actix_web::Error>(frame), rx)),
                    None => continue,
                },
                Err(broadcast::error::RecvError::Lagged(perdidos)) => {
                    tracing::debug!(perdidos, "Suscriptor SSE atrasado, saltando eventos");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(eventos)
}

fn codificar(cambio: &Cambio) -> Option<web::Bytes> {
    match serde_json::to_string(cambio) {
        Ok(json) => Some(web::Bytes::from(format!("data: {json}\n\n"))),
        Err(error) => {
            tracing::error!(%error, "No se pudo serializar el cambio");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codifica_evento_sse() {
        let cambio = Cambio {
            tabla: "pedidos".to_string(),
            op: "UPDATE".to_string(),
        };
        let frame = codificar(&cambio).unwrap();
        let texto = std::str::from_utf8(&frame).unwrap();
        assert!(texto.starts_with("data: "));
        assert!(texto.ends_with("\n\n"));
        assert!(texto.contains(r#""tabla":"pedidos""#));
    }
}
