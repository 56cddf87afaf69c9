//! Janelas de coincidência
//!
//! A primeira entrada abre uma janela; a segunda entrada do outro lado,
//! dentro da janela, a fecha imediatamente. Expirada com um único lado, a
//! janela vira falha entregue apenas a esse lado.

use fso_core::{Side, Signal, SimDuration, SimTime};

/// Pedido de agendamento do fechamento de uma janela
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arm {
    pub window_id: u64,
    pub close_at: SimTime,
}

/// Janela fechada, pronta para classificação
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Closed {
    pub window_id: u64,
    pub left: Option<Signal>,
    pub right: Option<Signal>,
}

impl Closed {
    pub fn input(&self, side: Side) -> Option<&Signal> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Lados que enviaram algo
    pub fn senders(&self) -> Vec<Side> {
        Side::BOTH
            .into_iter()
            .filter(|side| self.input(*side).is_some())
            .collect()
    }
}

/// Efeito de uma entrada sobre as janelas
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Offer {
    /// Janelas fechadas por esta entrada (em ordem)
    pub closed: Vec<Closed>,
    /// Nova janela aberta por esta entrada
    pub armed: Option<Arm>,
}

#[derive(Debug)]
struct Open {
    id: u64,
    close_at: SimTime,
    left: Option<Signal>,
    right: Option<Signal>,
}

impl Open {
    fn slot(&mut self, side: Side) -> &mut Option<Signal> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn close(self) -> Closed {
        Closed {
            window_id: self.id,
            left: self.left,
            right: self.right,
        }
    }
}

/// Rastreador de janela de coincidência (no máximo uma aberta)
#[derive(Debug)]
pub struct CoincidenceWindow {
    width: SimDuration,
    open: Option<Open>,
    next_id: u64,
}

impl CoincidenceWindow {
    pub fn new(width: SimDuration) -> Self {
        Self {
            width,
            open: None,
            next_id: 0,
        }
    }

    pub fn width(&self) -> SimDuration {
        self.width
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Registra entrada num lado
    pub fn offer(&mut self, now: SimTime, side: Side, signal: Signal) -> Offer {
        let mut offer = Offer::default();

        if let Some(mut open) = self.open.take() {
            let expired = now > open.close_at;
            let occupied = open.slot(side).is_some();
            if !expired && !occupied {
                *open.slot(side) = Some(signal);
                offer.closed.push(open.close());
                return offer;
            }
            // Janela vencida ou lado repetido: descarrega como falha unilateral
            offer.closed.push(open.close());
        }

        let id = self.next_id;
        self.next_id += 1;
        let close_at = now + self.width;
        let mut open = Open {
            id,
            close_at,
            left: None,
            right: None,
        };
        *open.slot(side) = Some(signal);
        self.open = Some(open);
        offer.armed = Some(Arm {
            window_id: id,
            close_at,
        });
        offer
    }

    /// Fecha a janela por expiração; ignora ids já resolvidos
    pub fn expire(&mut self, window_id: u64) -> Option<Closed> {
        match &self.open {
            Some(open) if open.id == window_id => self.open.take().map(Open::close),
            _ => None,
        }
    }
}
