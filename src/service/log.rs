use std::{
   future::{ready, Ready},
   io::Write,
   time::Instant,
};

use actix_web::{
   dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
   Error,
};
use colored::Colorize;
use env_logger::{Builder, Env};
use futures_util::future::LocalBoxFuture;
use log::{log, Level};

/// One line per request: method, path, caller, status and elapsed time.
/// Server errors log at `error`, client errors at `warn`.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type InitError = ();
   type Transform = LoggerMiddlewareService<S>;
   type Future = Ready<Result<Self::Transform, Self::InitError>>;

   fn new_transform(&self, service: S) -> Self::Future {
      ready(Ok(LoggerMiddlewareService { service }))
   }
}

pub struct LoggerMiddlewareService<S> {
   service: S
}

fn level_for(status: u16) -> Level {
   match status {
      500.. => Level::Error,
      400..=499 => Level::Warn,
      _ => Level::Info,
   }
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

   forward_ready!(service);

   fn call(&self, req: ServiceRequest) -> Self::Future {
      let started = Instant::now();
      let line = format!(
         "{} {} from {}",
         req.method(),
         req.path(),
         req.connection_info().realip_remote_addr().unwrap_or("-")
      );
      let fut = self.service.call(req);

      Box::pin(async move {
         let res = fut.await;
         let elapsed = started.elapsed().as_millis();
         match &res {
            Ok(res) => {
               let status = res.status().as_u16();
               log!(level_for(status), "{} -> {} in {}ms", line, status, elapsed);
            },
            Err(err) => log!(Level::Error, "{} failed after {}ms: {}", line, elapsed, err),
         }
         res
      })
   }
}

pub fn init_logger() {
   Builder::from_env(Env::default().default_filter_or("info"))
   .format(|buf, record| {
      let level = record.level().to_string();
      let level = match record.level() {
         Level::Error => level.red().bold(),
         Level::Warn => level.yellow().bold(),
         Level::Info => level.green().bold(),
         Level::Debug => level.blue().bold(),
         Level::Trace => level.magenta().bold(),
      };
      writeln!(
         buf,
         "{} {} [{}] {}",
         buf.timestamp_seconds(),
         level,
         record.target(),
         record.args()
      )
   })
   .init()
}
