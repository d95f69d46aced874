use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentCompletedEvent, PaymentRejectedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_completed_producer: Vec<EventProducer<PaymentCompletedEvent>>,
    pub payment_rejected_producer: Vec<EventProducer<PaymentRejectedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_completed: Option<EventHandler<PaymentCompletedEvent>>,
    pub on_payment_rejected: Option<EventHandler<PaymentRejectedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_completed = hooks.on_payment_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_rejected = hooks.on_payment_rejected.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_completed, on_payment_rejected }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_completed {
            result.payment_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_rejected {
            result.payment_rejected_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_completed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_rejected {
            tokio::spawn(handler.start_handler());
        }
    }
}

type BoxedHook = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_completed: Option<Handler<PaymentCompletedEvent>>,
    pub on_payment_rejected: Option<Handler<PaymentRejectedEvent>>,
}

impl EventHooks {
    pub fn on_payment_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentCompletedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_payment_completed = Some(Arc::new(f));
        self
    }

    pub fn on_payment_rejected<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentRejectedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_payment_rejected = Some(Arc::new(f));
        self
    }
}
